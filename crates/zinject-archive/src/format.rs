use std::io::Read;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar(TarCompress),
}

impl ArchiveFormat {
    /// Whether this build can unpack the format.
    pub fn is_available(self) -> bool {
        match self {
            Self::Zip => cfg!(feature = "zip"),
            Self::Tar(TarCompress::None | TarCompress::Gzip) => cfg!(feature = "tar"),
            Self::Tar(TarCompress::Xz) => cfg!(feature = "xz"),
            Self::Tar(TarCompress::Zstd) => cfg!(feature = "zstd"),
        }
    }
}

/// Compression codec for tar archives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TarCompress {
    None,
    Gzip,
    Xz,
    Zstd,
}

struct MimeType {
    name: &'static str,
    extensions: &'static [&'static str],
    /// `None` for types that are recognised but cannot be unpacked here.
    format: Option<ArchiveFormat>,
}

const MIME_TYPES: &[MimeType] = &[
    MimeType {
        name: "application/x-tar",
        extensions: &[".tar"],
        format: Some(ArchiveFormat::Tar(TarCompress::None)),
    },
    MimeType {
        name: "application/x-compressed-tar",
        extensions: &[".tar.gz", ".tgz"],
        format: Some(ArchiveFormat::Tar(TarCompress::Gzip)),
    },
    MimeType {
        name: "application/x-xz-compressed-tar",
        extensions: &[".tar.xz", ".txz"],
        format: Some(ArchiveFormat::Tar(TarCompress::Xz)),
    },
    MimeType {
        name: "application/x-zstd-compressed-tar",
        extensions: &[".tar.zst", ".tzst"],
        format: Some(ArchiveFormat::Tar(TarCompress::Zstd)),
    },
    MimeType {
        name: "application/zip",
        extensions: &[".zip", ".jar"],
        format: Some(ArchiveFormat::Zip),
    },
    MimeType {
        name: "application/x-bzip-compressed-tar",
        extensions: &[".tar.bz2", ".tbz2"],
        format: None,
    },
    MimeType {
        name: "application/x-lzma-compressed-tar",
        extensions: &[".tar.lzma"],
        format: None,
    },
    MimeType {
        name: "application/x-deb",
        extensions: &[".deb"],
        format: None,
    },
    MimeType {
        name: "application/x-rpm",
        extensions: &[".rpm"],
        format: None,
    },
    MimeType {
        name: "application/x-ruby-gem",
        extensions: &[".gem"],
        format: None,
    },
    MimeType {
        name: "application/x-apple-diskimage",
        extensions: &[".dmg"],
        format: None,
    },
    MimeType {
        name: "application/vnd.ms-cab-compressed",
        extensions: &[".cab"],
        format: None,
    },
    MimeType {
        name: "application/x-7z-compressed",
        extensions: &[".7z"],
        format: None,
    },
];

/// Guess an archive MIME type from the file extension of `url`.
///
/// Query strings and fragments are ignored; matching is case-insensitive.
pub fn type_from_url(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|t| t.extensions.iter().any(|ext| path.ends_with(ext)))
        .map(|t| t.name)
}

/// Resolve a MIME type to a format this build can unpack.
pub fn format_for(mime_type: &str) -> Result<ArchiveFormat> {
    MIME_TYPES
        .iter()
        .find(|t| t.name == mime_type)
        .and_then(|t| t.format)
        .filter(|f| f.is_available())
        .ok_or_else(|| Error::UnsupportedType {
            mime_type: mime_type.to_string(),
        })
}

/// Fail with [`Error::UnsupportedType`] unless `mime_type` can be unpacked.
pub fn check_type_supported(mime_type: &str) -> Result<()> {
    format_for(mime_type).map(|_| ())
}

#[cfg(feature = "tar")]
impl TarCompress {
    /// Create a decoder for this compression codec.
    pub fn decoder<R: Read>(self, reader: R) -> Result<Decoder<R>> {
        match self {
            Self::None => Ok(Decoder::Passthrough(reader)),
            Self::Gzip => Ok(Decoder::Gzip(Box::new(flate2::read::GzDecoder::new(
                reader,
            )))),
            #[cfg(feature = "xz")]
            Self::Xz => Ok(Decoder::Xz(Box::new(xz2::read::XzDecoder::new(reader)))),
            #[cfg(not(feature = "xz"))]
            Self::Xz => Err(Error::UnsupportedType {
                mime_type: "application/x-xz-compressed-tar".into(),
            }),
            #[cfg(feature = "zstd")]
            Self::Zstd => {
                let decoder = zstd::stream::read::Decoder::new(reader)
                    .map_err(|e| Error::Corrupted(e.to_string()))?;
                Ok(Decoder::Zstd(Box::new(decoder)))
            }
            #[cfg(not(feature = "zstd"))]
            Self::Zstd => Err(Error::UnsupportedType {
                mime_type: "application/x-zstd-compressed-tar".into(),
            }),
        }
    }
}

/// Decoder wrapper for tar decompression.
#[cfg(feature = "tar")]
pub enum Decoder<R: Read> {
    Passthrough(R),
    Gzip(Box<flate2::read::GzDecoder<R>>),
    #[cfg(feature = "xz")]
    Xz(Box<xz2::read::XzDecoder<R>>),
    #[cfg(feature = "zstd")]
    Zstd(Box<zstd::stream::read::Decoder<'static, std::io::BufReader<R>>>),
}

#[cfg(feature = "tar")]
impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Passthrough(r) => r.read(buf),
            Self::Gzip(d) => d.read(buf),
            #[cfg(feature = "xz")]
            Self::Xz(d) => d.read(buf),
            #[cfg(feature = "zstd")]
            Self::Zstd(d) => d.read(buf),
        }
    }
}
