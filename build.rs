use std::env;
use std::path::PathBuf;

fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // pkg-config finds FFmpeg everywhere except Windows.
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows"
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!("cargo:warning=rawdump: set FFMPEG_DIR to an FFmpeg install (or VCPKG_ROOT to a vcpkg tree containing ffmpeg).");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if candidate.exists() {
        println!(
            "cargo:warning=rawdump: found FFmpeg at {0}; export FFMPEG_DIR={0} so ffmpeg-sys-next links it.",
            candidate.display()
        );
    } else {
        println!(
            "cargo:warning=rawdump: no FFmpeg install under {}.",
            candidate.display()
        );
    }
}
