//! Names of the automatically recorded fields.

/// Local time the record was written, `%Y-%m-%d %H:%M:%S%z`.
pub const TIMESTAMP: &str = "timestamp";
/// Login name of the invoking user.
pub const LOGIN: &str = "login";
pub const UNAME_OS: &str = "uname_os";
pub const UNAME_HOST: &str = "uname_host";
pub const UNAME_RELEASE: &str = "uname_release";
/// Edition or codename of the operating system release.
pub const UNAME_VERSION: &str = "uname_version";
pub const UNAME_MACHINE: &str = "uname_machine";
/// Working directory of the writing process.
pub const CWD: &str = "cwd";
/// Base name of the invoking program.
pub const SCRIPT: &str = "script";
/// Directory part of the invoking program path.
pub const SCRIPT_DIR: &str = "script_dir";
/// Arguments after the program name, space-joined.
pub const COMMANDLINE: &str = "commandline";
/// Version of the compiler that built the recording program.
pub const RUNTIME_VERSION: &str = "runtime_version";
/// Mapping of component name → version string (or `"unknown"`).
pub const COMPONENT_VERSIONS: &str = "component_versions";
/// File name of the file the record was written to.
pub const FILENAME: &str = "filename";

/// Every automatic field, in recording order.
pub const AUTOMATIC: &[&str] = &[
    TIMESTAMP,
    LOGIN,
    UNAME_OS,
    UNAME_HOST,
    UNAME_RELEASE,
    UNAME_VERSION,
    UNAME_MACHINE,
    CWD,
    SCRIPT,
    SCRIPT_DIR,
    COMMANDLINE,
    RUNTIME_VERSION,
    COMPONENT_VERSIONS,
    FILENAME,
];

/// Whether `name` is one of the automatic field names.
pub fn is_automatic(name: &str) -> bool {
    AUTOMATIC.contains(&name)
}
