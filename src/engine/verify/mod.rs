pub mod verifier;

pub use verifier::{Remediation, VerifyOutcome, verify_group};
