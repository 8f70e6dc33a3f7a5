#![no_main]

use libfuzzer_sys::fuzz_target;
use meshconv::io::FileFormat;

fuzz_target!(|data: &[u8]| {
    // We are only interested in panics, so the result is ignored. It's fine
    // if the reader says "this is not a valid STL file".
    let _ = FileFormat::Stl.read(data);
});
