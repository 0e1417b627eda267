pub mod solutions;
pub mod upload;

pub use solutions::{Solution, SolutionSet, SolutionsError};
pub use upload::UploadedDocument;
