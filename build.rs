use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=OCI_LIB_DIR");
    if env::var_os("CARGO_FEATURE_OCI").is_none() {
        return;
    }
    let windows = env::var("CARGO_CFG_TARGET_OS").map(|os| os == "windows").unwrap_or(false);
    let oracle_client_lib = if windows { "oci" } else { "clntsh" };
    println!("cargo:rustc-link-lib=dylib={}", oracle_client_lib);

    if let Some( dir ) = env::var_os("OCI_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", PathBuf::from(dir).display());
    } else if windows {
        if let Some( path ) = env::var_os("PATH") {
            for dir in env::split_paths(&path) {
                if has_oci_dll(&dir) {
                    println!("cargo:rustc-link-search=native={}", dir.display());
                }
            }
        }
    }
}

fn has_oci_dll(dir: &PathBuf) -> bool {
    if let Ok( iter ) = dir.read_dir() {
        for entry in iter {
            if let Ok( file ) = entry {
                if let Some( name ) = file.file_name().to_str() {
                    if name.to_lowercase() == "oci.dll" {
                        return true;
                    }
                }
            }
        }
    }
    false
}
