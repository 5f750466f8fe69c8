//! Little-endian encoding helpers shared by the binary formats.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Strings longer than this are rejected on read so a corrupt length can't trigger a huge allocation.
pub const MAX_STRING_BYTES: u32 = 1 << 16;

/// Writes a `u32` byte length followed by the UTF-8 bytes.
pub fn write_string(writer: &mut dyn Write, s: &str) -> io::Result<()> {
    let len = u32::try_from(s.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
    writer.write_u32::<LittleEndian>(len)?;
    writer.write_all(s.as_bytes())
}

pub fn read_string(reader: &mut dyn Read) -> io::Result<String> {
    let len = reader.read_u32::<LittleEndian>()?;
    if len > MAX_STRING_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("string length {} exceeds {}", len, MAX_STRING_BYTES),
        ));
    }
    let mut bytes = vec![0; len as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[inline]
pub fn write_u16(writer: &mut dyn Write, value: u16) -> io::Result<()> {
    writer.write_u16::<LittleEndian>(value)
}

#[inline]
pub fn read_u16(reader: &mut dyn Read) -> io::Result<u16> {
    reader.read_u16::<LittleEndian>()
}

#[inline]
pub fn write_i32(writer: &mut dyn Write, value: i32) -> io::Result<()> {
    writer.write_i32::<LittleEndian>(value)
}

#[inline]
pub fn read_i32(reader: &mut dyn Read) -> io::Result<i32> {
    reader.read_i32::<LittleEndian>()
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
