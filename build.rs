use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
    println!("cargo:rerun-if-env-changed=VCPKG_ROOT");
    println!("cargo:rerun-if-env-changed=VCPKGRS_TRIPLET");

    // Only Windows builds need help locating FFmpeg.
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows" {
        return;
    }
    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=gif-maker needs FFmpeg. Set FFMPEG_DIR, or install ffmpeg with vcpkg and set VCPKG_ROOT."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let install_dir = PathBuf::from(vcpkg_root).join("installed").join(triplet);

    if install_dir.exists() {
        println!(
            "cargo:warning=Using vcpkg FFmpeg candidate {}; set FFMPEG_DIR to it if linking fails.",
            install_dir.display(),
        );
    } else {
        println!(
            "cargo:warning=No vcpkg FFmpeg install at {}.",
            install_dir.display(),
        );
    }
}
