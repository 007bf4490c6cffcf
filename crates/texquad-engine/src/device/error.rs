/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the draw may be retried on the next redraw.
    Reconfigured,
    /// Transient error; skip the current draw.
    SkipFrame,
    /// Fatal error (commonly OOM); the target must halt.
    Fatal,
}
