//! Result types shared by every command creator.

use stepgen_types::{GenerationError, GenerationWarning, Instruction, RobotState};

/// Successful output of one command creator: the instructions it
/// emitted and any warnings raised while emitting them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatorOutput {
    pub instructions: Vec<Instruction>,
    pub warnings: Vec<GenerationWarning>,
}

impl CreatorOutput {
    /// Output consisting of exactly one instruction.
    #[must_use]
    pub fn one(instruction: Instruction) -> Self {
        Self {
            instructions: vec![instruction],
            warnings: Vec::new(),
        }
    }

}

/// Either emitted instructions or a non-empty list of fatal errors.
///
/// Atomic creators collect every error their validation battery finds
/// rather than stopping at the first, so a caller sees the full
/// picture in one pass.
pub type CreatorResult = Result<CreatorOutput, Vec<GenerationError>>;

/// Output of one whole step: the flattened instruction list, the
/// warnings gathered along the way, and the state after the last
/// instruction was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub instructions: Vec<Instruction>,
    pub warnings: Vec<GenerationWarning>,
    pub state: RobotState,
}
