// crates/afv_io/src/lib.rs

//! 求解结果输出：VTU 体数据、壁面系数与收敛历史

pub mod error;
pub mod history;
pub mod surface;
pub mod vtu;

pub use error::{OutputError, OutputResult};
pub use history::HistoryWriter;
pub use surface::SurfaceWriter;
pub use vtu::VtuWriter;
