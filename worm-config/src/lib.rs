use anyhow::{Context, Result};
use std::path::Path;
use worm_types::WorldState;

mod board;
mod state_file;

pub use board::board_to_ascii;
pub use state_file::{render_world_state, world_state_from_str, ConfigError};

pub fn load_world_state_from_path(path: &Path) -> Result<WorldState> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("can not open state file {}", path.display()))?;
    world_state_from_str(&raw)
        .with_context(|| format!("error while parsing state file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_state_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, "1 2\n0 1 2\n1\n0\n0\n* * \n    \n").expect("write state");

        let state = load_world_state_from_path(file.path()).expect("state should load");
        assert_eq!((state.height, state.width), (1, 2));
        assert_eq!(state.worm.col, 1);
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("absent.txt");
        let err = load_world_state_from_path(&path).expect_err("file does not exist");
        assert!(format!("{err:#}").contains("absent.txt"));
    }

    #[test]
    fn validation_error_keeps_its_type_under_context() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, "1 2\n0 5 0\n0\n0\n* * \n    \n").expect("write state");

        let err = load_world_state_from_path(file.path()).expect_err("column out of range");
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::WormColOutOfRange { col: 5, width: 2 })
        );
    }
}
