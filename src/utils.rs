/// Random 64-bit hex identifier. Used for jobs and wordlists; unique enough
/// that concurrent allocations never collide in practice.
pub fn generate_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}
