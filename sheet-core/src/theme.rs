use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("cannot read color theme {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid color theme {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Board colors keyed by the names python-chess uses for `chess.svg.board`,
/// plus the piece colors. Any CSS color string is accepted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColorTheme {
    #[serde(rename = "square light")]
    pub square_light: String,
    #[serde(rename = "square dark")]
    pub square_dark: String,
    #[serde(rename = "square light lastmove")]
    pub square_light_lastmove: String,
    #[serde(rename = "square dark lastmove")]
    pub square_dark_lastmove: String,
    pub margin: String,
    pub coord: String,
    #[serde(rename = "inner border")]
    pub inner_border: String,
    #[serde(rename = "outer border")]
    pub outer_border: String,
    #[serde(rename = "piece white")]
    pub piece_white: String,
    #[serde(rename = "piece black")]
    pub piece_black: String,
    #[serde(rename = "piece outline")]
    pub piece_outline: String,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            square_light: "#ffce9e".to_string(),
            square_dark: "#d18b47".to_string(),
            square_light_lastmove: "#cdd16a".to_string(),
            square_dark_lastmove: "#aaa23b".to_string(),
            margin: "#212121".to_string(),
            coord: "#e5e5e5".to_string(),
            inner_border: "#111111".to_string(),
            outer_border: "#111111".to_string(),
            piece_white: "#ffffff".to_string(),
            piece_black: "#000000".to_string(),
            piece_outline: "#000000".to_string(),
        }
    }
}

impl ColorTheme {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ThemeError> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).map_err(|source| ThemeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&txt).map_err(|source| ThemeError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_theme_keeps_defaults() {
        let theme: ColorTheme = serde_json::from_str(
            r##"{"square light": "#eeeeee", "square dark": "#999999", "arrow green": "#15781B80"}"##,
        )
        .unwrap();
        assert_eq!(theme.square_light, "#eeeeee");
        assert_eq!(theme.square_dark, "#999999");
        assert_eq!(theme.margin, ColorTheme::default().margin);
        assert_eq!(theme.piece_black, "#000000");
    }

    #[test]
    fn empty_object_is_the_default_theme() {
        let theme: ColorTheme = serde_json::from_str("{}").unwrap();
        assert_eq!(theme, ColorTheme::default());
    }

    #[test]
    fn load_reports_missing_file_and_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(ColorTheme::load(&missing), Err(ThemeError::Io { .. })));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(ColorTheme::load(&bad), Err(ThemeError::Json { .. })));

        let good = dir.path().join("good.json");
        fs::write(&good, r##"{"coord": "#000000"}"##).unwrap();
        assert_eq!(ColorTheme::load(&good).unwrap().coord, "#000000");
    }
}
