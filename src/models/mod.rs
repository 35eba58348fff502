mod action;
mod qr;
mod scan;

pub use action::{QrAction, QrActionKind, QrActionRow};
pub use qr::{GeoData, MultiUrl, QrRecord, QrRecordRow, QrType};
pub use scan::{Coordinates, DeviceType, NewScanLog, ScanContext, ScanLogEntry};
