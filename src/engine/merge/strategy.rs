use tracing::info;

use crate::engine::store::DatasetFile;

/// How row-table content moves from inputs to the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Concatenate compressed column blocks without re-encoding rows. Valid
    /// only when every input shares the output's compression settings.
    Structural,
    /// Decode and re-encode every row with the output codec.
    RowCopy,
}

/// Strategy plus the compression settings the output will carry. Decided
/// once per output file from the full input set.
#[derive(Clone, Copy, Debug)]
pub struct MergeMode {
    pub strategy: MergeStrategy,
    pub settings: u32,
}

pub fn select_mode(inputs: &[DatasetFile], fallback: u32) -> MergeMode {
    let reference = inputs[0].settings;
    let uniform = inputs.iter().all(|f| f.settings == reference);
    if uniform {
        info!(target: "merge::strategy", settings = reference, "Input compression");
        MergeMode {
            strategy: MergeStrategy::Structural,
            settings: reference,
        }
    } else {
        info!(
            target: "merge::strategy",
            fallback,
            "Disabling fast merging as inputs have different compressions"
        );
        MergeMode {
            strategy: MergeStrategy::RowCopy,
            settings: fallback,
        }
    }
}
