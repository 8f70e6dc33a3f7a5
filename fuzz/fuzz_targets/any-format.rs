#![no_main]

use libfuzzer_sys::fuzz_target;
use meshconv::io::{FileFormat, WriteOptions};

fuzz_target!(|data: &[u8]| {
    // Detect the format like `read_file` does for files without extension.
    // Everything that was read successfully has to be writable in all
    // formats (except for values out of range for binary STL).
    let format = match FileFormat::from_file_start(&data[..data.len().min(1024)]) {
        Some(format) => format,
        None => return,
    };

    if let Ok(mesh) = format.read(data) {
        assert_eq!(mesh.check(), Ok(()));
        for &target in &FileFormat::ALL {
            let res = target.write_to_memory(&mesh, &WriteOptions::default());
            if target != FileFormat::Stl {
                assert!(res.is_ok(), "failed to write {}: {:?}", target, res.err());
            }
        }
    }
});
