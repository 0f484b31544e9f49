use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("cannot write {}: {source}", path.display())]
    RenderTarget { path: PathBuf, source: io::Error },
    #[error("diagram {index} is not valid SVG: {source}")]
    DiagramConversion { index: usize, source: usvg::Error },
    #[error("cannot allocate a {width}x{height} pixmap")]
    Raster { width: u32, height: u32 },
    #[error(transparent)]
    Png(#[from] png::EncodingError),
}
