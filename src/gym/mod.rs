pub mod board;
pub mod reward;
pub mod slither;
pub mod vision;

pub use board::{Board, Cell, Dir, Pos};
pub use reward::RewardConfig;
pub use slither::{Slither, SlitherConfig, Status, Termination, HEIGHT, WIDTH};
pub use vision::{Distance, Object, Sight, VisionConfig, VisionState};
