use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Path of an executable that blocks for a long time when run with no
/// arguments and an empty environment.
///
/// Created once per test binary so no test execs a file another thread is
/// still writing.
pub(crate) fn long_running_script() -> String {
    static SCRIPT: OnceLock<PathBuf> = OnceLock::new();
    let path = SCRIPT.get_or_init(|| {
        let path = std::env::temp_dir().join(format!("shredder_sleeper_{}", std::process::id()));
        fs::write(&path, "#!/bin/sh\nexec sleep 30\n").expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
        path
    });
    path.to_string_lossy().into_owned()
}
