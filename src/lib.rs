//! spoolprep: turns heterogeneous print payloads (raw command bytes, images,
//! PDF, RTF, and XML-embedded commands) into prepared, ready-to-emit print
//! elements.
//!
//! ```no_run
//! use spoolprep::{ElementPreparer, PrintElement, PrintJob};
//! use spoolprep_shared::{Charset, DotDensity};
//!
//! # async fn run() -> Result<(), spoolprep::PrepareError> {
//! let preparer = ElementPreparer::default();
//! let mut job = PrintJob::new();
//! job.append(PrintElement::raw_with_language(vec![0x1Bu8, 0x40], Charset::UTF_8, "escpos", DotDensity(24)));
//! job.append(PrintElement::image(std::path::PathBuf::from("logo.png"), Charset::UTF_8, 10, 20));
//! for element in job.prepare(&preparer).await? {
//!     println!("{:?} {}", element.sequence(), element.kind());
//! }
//! # Ok(())
//! # }
//! ```

pub mod element;
pub mod error;
pub mod input;
pub mod job;
pub mod observer;
pub mod output;
pub mod preparer;
pub mod report;
pub mod source;
pub mod transform;

pub use element::{ElementConfig, ElementStatus, ImagePlacement, PrintElement, RawConfig, XmlConfig};
pub use error::PrepareError;
pub use job::{ElementOutcome, PrintJob};
pub use observer::{NullObserver, PrepareEvent, PrepareObserver, TracingObserver};
pub use output::{PageBox, PdfDocument, PreparedOutput, RasterImage, RenderedSurface, SurfaceLine};
pub use preparer::{ElementPreparer, PrepareHandle, PrepareSettings};
pub use source::{FsResolver, SourceData, SourceResolver};
