use crate::shader::UniformLocation;

/// CPU copy of the program's uniform block.
///
/// Members are addressed by the byte offset the shader reflection reported;
/// a write returns the touched byte range so only those bytes go through the
/// queue.
#[derive(Debug, Clone)]
pub(crate) struct UniformMirror {
    bytes: Vec<u8>,
}

impl UniformMirror {
    pub fn new(size: u32) -> Self {
        Self {
            bytes: vec![0; size as usize],
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Stores `value` at `location`; `None` when the member lies outside the
    /// block.
    pub fn write_f32(&mut self, location: UniformLocation, value: f32) -> Option<(u64, &[u8])> {
        let start = location.offset() as usize;
        let end = start + std::mem::size_of::<f32>();
        let slot = self.bytes.get_mut(start..end)?;
        slot.copy_from_slice(bytemuck::bytes_of(&value));
        Some((start as u64, &self.bytes[start..end]))
    }

    #[cfg(test)]
    pub fn read_f32(&self, location: UniformLocation) -> Option<f32> {
        let start = location.offset() as usize;
        let bytes = self.bytes.get(start..start + std::mem::size_of::<f32>())?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::ShaderProgram;

    #[test]
    fn writes_land_at_member_offsets() {
        let program = ShaderProgram::embedded().unwrap();
        let block = program.uniform_block().unwrap();
        let width = program.resolve_uniform("width").unwrap();
        let time = program.resolve_uniform("u_time").unwrap();

        let mut mirror = UniformMirror::new(block.size);
        let (offset, bytes) = mirror.write_f32(time, 1.5).unwrap();
        assert_eq!(offset, u64::from(time.offset()));
        assert_eq!(bytes, 1.5_f32.to_ne_bytes());

        mirror.write_f32(width, 1024.0).unwrap();
        assert_eq!(mirror.read_f32(width), Some(1024.0));
        assert_eq!(mirror.read_f32(time), Some(1.5));
        assert_eq!(mirror.size(), u64::from(block.size));
    }

    #[test]
    fn out_of_range_write_is_rejected() {
        let program = ShaderProgram::embedded().unwrap();
        let time = program.resolve_uniform("u_time").unwrap();
        let mut tiny = UniformMirror::new(4);
        assert!(tiny.write_f32(time, 2.0).is_none());
        assert_eq!(tiny.read_f32(time), None);
    }
}
