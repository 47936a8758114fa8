fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    // This needs to be in build.rs as it takes too long to run in MIR, and hits the const_eval_limit
    // This also means it doesn't need recalculated every time we compile
    let out_dir = std::env::var_os("OUT_DIR").unwrap();
    let path = std::path::Path::new(&out_dir).join("hex.rs");
    let lookup_table = format!("{:?}", generate_hex_pair_table());
    std::fs::write(
        &path,
        format!(
            "pub const HEX_INVALID: u16 = 0x{INVALID:x};\npub static HEX_PAIR_LOOKUP: [u16; 1 << 16] = {lookup_table};"
        ),
    )
    .unwrap();
}

/// Set in a table entry when either character of the pair is not a hex digit
const INVALID: u16 = 0x100;

/// Maps every pair of ASCII bytes (high byte first) to the byte value they encode in hex, with
/// `INVALID` or'ed in when the pair is not two hex digits
fn generate_hex_pair_table() -> Vec<u16> {
    let mut output = vec![0u16; 1 << 16];
    for (input, entry) in output.iter_mut().enumerate() {
        let left = (input >> 8) as u8;
        let right = (input & 0xFF) as u8;
        *entry = match (map_hex_char(left), map_hex_char(right)) {
            (Some(l), Some(r)) => ((l << 4) | r) as u16,
            _ => INVALID,
        };
    }
    output
}

const fn map_hex_char(input: u8) -> Option<u8> {
    match input {
        b'0'..=b'9' => Some(input - b'0'),
        b'A'..=b'F' => Some(input - b'A' + 10),
        b'a'..=b'f' => Some(input - b'a' + 10),
        _ => None,
    }
}
