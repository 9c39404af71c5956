use std::path::{Path, PathBuf};

pub const MELANGE_DIR: &str = ".melange";
pub const CONFIG_FILE: &str = ".melange/config.yaml";
pub const STATE_FILE: &str = ".melange/state.yaml";

pub fn melange_dir(root: &Path) -> PathBuf {
    root.join(MELANGE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/program");
        assert_eq!(melange_dir(root), PathBuf::from("/tmp/program/.melange"));
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/program/.melange/config.yaml")
        );
        assert_eq!(
            state_path(root),
            PathBuf::from("/tmp/program/.melange/state.yaml")
        );
    }
}
