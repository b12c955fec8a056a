use std::path::PathBuf;

pub fn default_entry() -> Vec<String> {
    vec!["src/app.tsx".to_string()]
}

pub fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

pub fn default_styles_dir() -> PathBuf {
    PathBuf::from("public/styles")
}

pub fn default_dev_out_dir() -> PathBuf {
    PathBuf::from("build")
}

pub fn default_release_out_dir() -> PathBuf {
    PathBuf::from("dist")
}

pub fn default_watch_dir() -> PathBuf {
    PathBuf::from("src")
}

pub fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_port() -> u16 {
    8080
}

pub fn default_inject() -> Vec<String> {
    vec!["./node_modules/react/index.js".to_string()]
}

pub fn default_target() -> String {
    "es2021".to_string()
}

pub fn default_debounce_ms() -> u64 {
    100
}

pub fn default_client_queue() -> usize {
    16
}

pub fn default_send_timeout_ms() -> u64 {
    1000
}

pub fn default_esbuild() -> PathBuf {
    PathBuf::from("esbuild")
}

pub fn default_sass() -> PathBuf {
    PathBuf::from("sass")
}

pub fn default_styles() -> bool {
    true
}
