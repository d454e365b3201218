use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_rainbowfx")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "rainbowfx.exe"
            } else {
                "rainbowfx"
            });
            p
        })
}

#[test]
fn cli_writes_a_gif() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let input = dir.join("input.png");
    let output = dir.join("out.gif");
    let _ = std::fs::remove_file(&output);

    image::RgbImage::from_fn(16, 12, |x, y| image::Rgb([(x * 16) as u8, (y * 20) as u8, 128]))
        .save(&input)
        .unwrap();

    let status = std::process::Command::new(exe())
        .arg(&input)
        .arg(&output)
        .args(["--speed", "5", "--duration", "0.4", "--scheme", "patriotic"])
        .status()
        .expect("spawn rainbowfx");
    assert!(status.success());
    assert!(output.exists());
}

#[test]
fn cli_rejects_unknown_output_extension() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let input = dir.join("input2.png");
    let output = dir.join("out.webm");
    let _ = std::fs::remove_file(&output);

    image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]))
        .save(&input)
        .unwrap();

    let out = std::process::Command::new(exe())
        .arg(&input)
        .arg(&output)
        .output()
        .expect("spawn rainbowfx");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unsupported output extension"));
    assert!(!output.exists());
}
