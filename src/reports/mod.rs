pub mod export;
pub mod metrics;
pub mod pdf;

pub use export::{render_csv, report_rows, ReportRow};
pub use metrics::{dashboard, local_day_start, DashboardMetrics};
pub use pdf::render_pdf;
