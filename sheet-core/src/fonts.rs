use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};
use usvg::fontdb;

/// Environment variable naming an extra font file for diagram text.
pub const FONT_ENV: &str = "PUZZLE_SHEET_FONT";

/// Fonts available to the SVG renderer. Coordinate labels ask for
/// `sans-serif`, so that family has to resolve to something.
#[derive(Clone)]
pub struct FontLibrary {
    db: Arc<fontdb::Database>,
}

impl FontLibrary {
    /// Loads the system fonts plus `extra` (or the file named by
    /// [`FONT_ENV`]). The extra font becomes the `sans-serif` family.
    pub fn load(extra: Option<&Path>) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let system_faces = db.len();

        let from_env = std::env::var_os(FONT_ENV).map(std::path::PathBuf::from);
        let extra = extra.or(from_env.as_deref());
        if let Some(path) = extra {
            match db.load_font_file(path) {
                Ok(()) => {
                    let family = db
                        .faces()
                        .skip(system_faces)
                        .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
                    if let Some(name) = family {
                        info!("using {name} from {} as sans-serif", path.display());
                        db.set_sans_serif_family(name);
                    }
                }
                Err(e) => warn!("cannot load font {}: {e}", path.display()),
            }
        }
        if db.is_empty() {
            warn!("no fonts found, coordinate labels will not be drawn");
        }
        debug!("{} font faces loaded", db.len());
        Self { db: Arc::new(db) }
    }

    /// A library without any faces. Text in diagrams is skipped.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(fontdb::Database::new()),
        }
    }

    pub fn database(&self) -> &fontdb::Database {
        &self.db
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Parses `svg` into a render-ready tree with text converted to paths.
    pub(crate) fn parse(&self, svg: &str) -> Result<usvg::Tree, usvg::Error> {
        use usvg::{PostProcessingSteps, TreeParsing, TreePostProc};

        let options = usvg::Options::default();
        let mut tree = usvg::Tree::from_str(svg, &options)?;
        tree.postprocess(PostProcessingSteps::default(), &self.db);
        Ok(tree)
    }
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::load(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_extra_font_is_not_fatal() {
        let lib = FontLibrary::load(Some(Path::new("/definitely/not/a/font.ttf")));
        assert_eq!(lib.len(), lib.database().faces().count());
    }

    #[test]
    fn empty_library_still_parses_svg() {
        let lib = FontLibrary::empty();
        assert!(lib.is_empty());
        let tree = lib
            .parse(r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20"><rect width="10" height="20"/></svg>"#)
            .unwrap();
        assert_eq!(tree.size.width(), 10.0);
        assert_eq!(tree.size.height(), 20.0);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(FontLibrary::empty().parse("<not svg").is_err());
    }
}
