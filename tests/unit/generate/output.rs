use super::*;

fn frame(data: Vec<u8>, premultiplied: bool) -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 1,
        data,
        premultiplied,
    }
}

#[test]
fn slot_paths_follow_layout() {
    let root = Path::new("out");
    assert_eq!(
        SlotId::new(2, 3, 1).path_in(root),
        Path::new("out/variation2/post3/1.png")
    );
    assert_eq!(SlotId::new(1, 1, 2).to_string(), "variation 1 post 1 column 2");
    assert_eq!(SlotId::new(1, 2, 3).context(), SlotContext::new(1, 2, 3));
}

#[test]
fn encoded_png_decodes_to_straight_alpha() {
    let premul = frame(vec![255, 0, 0, 255, 64, 0, 0, 128], true);
    let bytes = encode_png(&premul).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (2, 1));
    assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
    let px = decoded.get_pixel(1, 0).0;
    assert_eq!(px[3], 128);
    assert!(px[0].abs_diff(128) <= 1);
}

#[test]
fn encoding_is_deterministic() {
    let f = frame(vec![1, 2, 3, 255, 4, 5, 6, 255], false);
    assert_eq!(encode_png(&f).unwrap(), encode_png(&f).unwrap());
}

#[test]
fn short_buffer_is_render_error() {
    let err = encode_png(&frame(vec![0; 4], false)).unwrap_err();
    assert!(err.to_string().starts_with("render error:"));
}

#[test]
fn atomic_write_leaves_no_temp_file() {
    let dir = PathBuf::from("target").join("output_unit");
    let _ = std::fs::remove_dir_all(&dir);
    let path = dir.join("variation1").join("post1").join("1.png");

    write_png(&path, &frame(vec![9, 9, 9, 255, 0, 0, 0, 0], false)).unwrap();
    assert!(path.is_file());
    assert!(!path.with_file_name("1.png.tmp").exists());

    // Overwrite in place.
    write_png(&path, &frame(vec![1, 1, 1, 255, 0, 0, 0, 0], false)).unwrap();
    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0, [1, 1, 1, 255]);
}

#[test]
fn failed_write_removes_partial_temp_file() {
    let dir = PathBuf::from("target").join("output_unit_partial");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("1.png");

    let err = replace_via_temp(&path, |tmp| {
        std::fs::write(tmp, b"half a png")?;
        Err(std::io::Error::other("disk full"))
    })
    .unwrap_err();

    assert!(err.to_string().contains("1.png.tmp"), "{err}");
    assert!(!path.with_file_name("1.png.tmp").exists());
    assert!(!path.exists());
}
