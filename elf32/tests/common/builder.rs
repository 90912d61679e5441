//! Byte-level ELF32 image builder for tests
//!
//! Lays out: file header, program header table, section header table,
//! then section/segment contents. Offsets are patched after the layout
//! is known, so tests can declare entries in any order.

use elf32::{EHDR_SIZE, PHDR_SIZE, SHDR_SIZE};

pub struct SegmentSpec {
    pub p_type: u32,
    pub vaddr: u32,
    pub data: Vec<u8>,
    /// Memory size; defaults to the data length when zero.
    pub memsz: u32,
}

pub struct SectionSpec {
    pub sh_type: u32,
    pub flags: u32,
    pub addr: u32,
    pub size: u32,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct ElfImageBuilder {
    entry: u32,
    shstrndx: u16,
    segments: Vec<SegmentSpec>,
    sections: Vec<SectionSpec>,
}

impl ElfImageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: u32) -> Self {
        self.entry = entry;
        self
    }

    pub fn shstrndx(mut self, index: u16) -> Self {
        self.shstrndx = index;
        self
    }

    pub fn segment(mut self, spec: SegmentSpec) -> Self {
        self.segments.push(spec);
        self
    }

    pub fn section(mut self, spec: SectionSpec) -> Self {
        self.sections.push(spec);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let phoff = if self.segments.is_empty() { 0 } else { EHDR_SIZE };
        let shoff = if self.sections.is_empty() {
            0
        } else {
            EHDR_SIZE + self.segments.len() * PHDR_SIZE
        };
        let mut content_off = EHDR_SIZE
            + self.segments.len() * PHDR_SIZE
            + self.sections.len() * SHDR_SIZE;

        let mut image = vec![0u8; content_off];

        // File header
        image[0..4].copy_from_slice(&[0x7f, b'E', b'L', b'F']);
        image[4] = 1; // ELFCLASS32
        image[5] = 1; // ELFDATA2LSB
        image[6] = 1; // EV_CURRENT
        put16(&mut image, 16, 2); // ET_EXEC
        put16(&mut image, 18, 40); // EM_ARM
        put32(&mut image, 24, self.entry);
        put32(&mut image, 28, phoff as u32);
        put32(&mut image, 32, shoff as u32);
        put16(&mut image, 42, PHDR_SIZE as u16);
        put16(&mut image, 44, self.segments.len() as u16);
        put16(&mut image, 46, SHDR_SIZE as u16);
        put16(&mut image, 48, self.sections.len() as u16);
        put16(&mut image, 50, self.shstrndx);

        // Program headers, contents appended afterwards
        for (i, seg) in self.segments.iter().enumerate() {
            let base = phoff + i * PHDR_SIZE;
            let memsz = if seg.memsz == 0 {
                seg.data.len() as u32
            } else {
                seg.memsz
            };
            put32(&mut image, base, seg.p_type);
            put32(&mut image, base + 4, content_off as u32);
            put32(&mut image, base + 8, seg.vaddr);
            put32(&mut image, base + 12, seg.vaddr);
            put32(&mut image, base + 16, seg.data.len() as u32);
            put32(&mut image, base + 20, memsz);
            content_off += seg.data.len();
        }

        // Section headers
        for (i, sec) in self.sections.iter().enumerate() {
            let base = shoff + i * SHDR_SIZE;
            put32(&mut image, base + 4, sec.sh_type);
            put32(&mut image, base + 8, sec.flags);
            put32(&mut image, base + 12, sec.addr);
            put32(&mut image, base + 20, sec.size);
            if !sec.data.is_empty() {
                put32(&mut image, base + 16, content_off as u32);
                content_off += sec.data.len();
            }
        }

        // Contents in declaration order
        for seg in &self.segments {
            image.extend_from_slice(&seg.data);
        }
        for sec in &self.sections {
            image.extend_from_slice(&sec.data);
        }

        image
    }
}

fn put16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
