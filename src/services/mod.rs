pub mod framework_probe;
pub mod page_loader;
pub mod pdf_exporter;
pub mod print_style;

pub use framework_probe::probe_framework;
pub use page_loader::{LoadOutcome, LoadTier, PageLoader, ReadinessState};
pub use pdf_exporter::export_pdf;
pub use print_style::{PrintStyle, SettleOutcome, StyleSettler};
