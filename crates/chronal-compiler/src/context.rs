//! Deterministic naming of intermediate maps.

/// FNV-1a over the source expression. The std hasher is randomly
/// seeded per process; intermediate names must not change between runs
/// of the same expression.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Allocates intermediate map names, unique within a run and stable
/// across runs of the same expression.
#[derive(Debug)]
pub struct CompileContext {
    tag: String,
    counter: u32,
}

impl CompileContext {
    pub fn new(expression: &str) -> Self {
        Self {
            tag: format!("{:08x}", fnv1a(expression.as_bytes()) as u32),
            counter: 0,
        }
    }

    pub fn next_virtual_name(&mut self) -> String {
        let name = format!("tmp_{}_{}", self.tag, self.counter);
        self.counter += 1;
        name
    }
}
