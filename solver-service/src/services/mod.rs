pub mod email;
pub mod executor;
pub mod extractor;
pub mod metrics;
pub mod prompt;
pub mod providers;
pub mod scratch;

pub use email::{EmailMessage, EmailProvider, MockEmailProvider, SmtpProvider};
pub use extractor::{NativePdfExtractor, PdftotextExtractor, TextExtractor};
pub use self::metrics::{init_metrics, render_metrics};
pub use prompt::build_prompt;
pub use providers::{GenerationParams, TextProvider};
pub use scratch::{ScratchDir, ScratchFile};
