/// Opaque task identifier assigned by the analysis backend.
///
/// The backend may report identifiers as JSON numbers or strings; they are
/// normalised to their string form on the way in.
pub type TaskId = String;

/// Percentage in `0.0..=100.0`.
pub type Percent = f64;
