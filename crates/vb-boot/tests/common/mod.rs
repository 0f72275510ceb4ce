// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 The vb-rs Authors

//! Test fixtures: keys, signed structures and a flash-backed host
//!
//! Legacy structures are signed with the `rsa` crate so the verifiers are
//! checked against an independent implementation. v2.1 structures use bare
//! SHA-256 "signatures", which need no private key.

#![allow(dead_code)]

use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey};
use sha2::Digest;
use vb_boot::common::CommonHeader;
use vb_boot::wire::{
    FwPreamble, GbbHeader, KernelPreamble, Keyblock, PackedKey, Signature, V21FwPreamble,
    V21Keyblock, V21PackedKey, V21Signature, FW_PREAMBLE_VERSION_MAJOR, GBB_MAGIC,
    GBB_VERSION_MAJOR, KERNEL_PREAMBLE_VERSION_MAJOR, KEYBLOCK_MAGIC, KEYBLOCK_VERSION_MAJOR,
    KEYBLOCK_VERSION_MINOR, MAGIC_FW_PREAMBLE, MAGIC_KEYBLOCK, MAGIC_PACKED_KEY, MAGIC_SIGNATURE,
    V21_VERSION_MAJOR,
};
use vb_boot::{BootHost, ResourceIndex};
use vb_common::{CryptoAlgorithm, Error, HashAlgorithm, KeyId, Result, SignatureAlgorithm};
use vb_crypto::{DigestContext, HwCrypto};
use zerocopy::native_endian::U64;
use zerocopy::{FromZeros, IntoBytes};

const RSA1024_PEM: &str = include_str!("../../../../testdata/rsa1024.pem");
const RSA2048_PEM: &str = include_str!("../../../../testdata/rsa2048.pem");
const RSA4096_PEM: &str = include_str!("../../../../testdata/rsa4096.pem");

/// Kernel body load address used by the kernel preamble builder
pub const BODY_LOAD_ADDRESS: u64 = 0x0010_0000;

// ============================================================================
// Work Buffer
// ============================================================================

/// Aligned backing store for a context
#[repr(align(16))]
pub struct Workbuf(pub [u8; 0x8000]);

impl Workbuf {
    pub fn new() -> Box<Self> {
        Box::new(Self([0; 0x8000]))
    }
}

/// Copy `bytes` to an aligned buffer, for unpacking keys outside a context
pub fn aligned(bytes: &[u8]) -> Box<Workbuf> {
    let mut buf = Workbuf::new();
    buf.0[..bytes.len()].copy_from_slice(bytes);
    buf
}

// ============================================================================
// Keys
// ============================================================================

/// RSA key pair with its legacy algorithm number
pub struct TestKey {
    private: RsaPrivateKey,
    pub alg: CryptoAlgorithm,
}

fn words_le(v: &BigUint, words: usize) -> Vec<u32> {
    let mut bytes = v.to_bytes_le();
    bytes.resize(words * 4, 0);
    bytes.chunks(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}

impl TestKey {
    fn load(pem: &str, alg: CryptoAlgorithm) -> Self {
        Self {
            private: RsaPrivateKey::from_pkcs8_pem(pem).unwrap(),
            alg,
        }
    }

    pub fn rsa1024(hash: HashAlgorithm) -> Self {
        Self::load(RSA1024_PEM, CryptoAlgorithm::from_pair(SignatureAlgorithm::Rsa1024, hash).unwrap())
    }

    pub fn rsa2048(hash: HashAlgorithm) -> Self {
        Self::load(RSA2048_PEM, CryptoAlgorithm::from_pair(SignatureAlgorithm::Rsa2048, hash).unwrap())
    }

    pub fn rsa4096(hash: HashAlgorithm) -> Self {
        Self::load(RSA4096_PEM, CryptoAlgorithm::from_pair(SignatureAlgorithm::Rsa4096, hash).unwrap())
    }

    pub fn sig_size(&self) -> usize {
        self.private.size()
    }

    /// Key data in the packed layout: `arrsize, n0inv, n[], rr[]`
    pub fn key_data(&self) -> Vec<u8> {
        let words = self.private.size() / 4;
        let n = self.private.n();
        let rr = (BigUint::from(1u32) << (64 * words)) % n;
        let n = words_le(n, words);
        let mut inv: u32 = 1;
        for _ in 0..5 {
            inv = inv.wrapping_mul(2u32.wrapping_sub(n[0].wrapping_mul(inv)));
        }

        let mut out = Vec::with_capacity(8 + 8 * words);
        out.extend_from_slice(&(words as u32).to_ne_bytes());
        out.extend_from_slice(&inv.wrapping_neg().to_ne_bytes());
        for w in n.iter().chain(words_le(&rr, words).iter()) {
            out.extend_from_slice(&w.to_ne_bytes());
        }
        out
    }

    /// Packed key header for this key, data placed `key_offset` bytes on
    pub fn packed_header(&self, key_offset: usize, version: u32) -> PackedKey {
        PackedKey {
            key_offset: key_offset as u32,
            key_size: self.key_data().len() as u32,
            algorithm: self.alg.as_raw(),
            key_version: version,
            ..PackedKey::default()
        }
    }

    /// Standalone legacy packed key
    pub fn packed(&self, version: u32) -> Vec<u8> {
        let mut out = self.packed_header(PackedKey::SIZE, version).as_bytes().to_vec();
        out.extend_from_slice(&self.key_data());
        out
    }

    /// PKCS#1 v1.5 signature of `data`
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        match self.alg.hash() {
            HashAlgorithm::Sha1 => {
                let digest = sha1::Sha1::digest(data);
                self.private.sign(Pkcs1v15Sign::new::<sha1::Sha1>(), &digest).unwrap()
            }
            HashAlgorithm::Sha256 => {
                let digest = sha2::Sha256::digest(data);
                self.private.sign(Pkcs1v15Sign::new::<sha2::Sha256>(), &digest).unwrap()
            }
            _ => {
                let digest = sha2::Sha512::digest(data);
                self.private.sign(Pkcs1v15Sign::new::<sha2::Sha512>(), &digest).unwrap()
            }
        }
    }
}

/// Every key a boot touches
pub struct KeySet {
    pub root: TestKey,
    pub fw_data: TestKey,
    pub kernel_subkey: TestKey,
    pub kernel_data: TestKey,
    pub recovery: TestKey,
}

impl KeySet {
    pub fn new() -> Self {
        Self {
            root: TestKey::rsa2048(HashAlgorithm::Sha256),
            fw_data: TestKey::rsa1024(HashAlgorithm::Sha256),
            kernel_subkey: TestKey::rsa2048(HashAlgorithm::Sha512),
            kernel_data: TestKey::rsa1024(HashAlgorithm::Sha1),
            recovery: TestKey::rsa4096(HashAlgorithm::Sha256),
        }
    }
}

// ============================================================================
// Legacy Structures
// ============================================================================

/// Legacy key block under construction
pub struct KeyblockBuilder<'a> {
    pub signer: &'a TestKey,
    pub data_key: &'a TestKey,
    pub key_version: u32,
    pub flags: u32,
    /// Bytes covered by the signature and checksum; `None` covers the
    /// header and data key
    pub signed_size: Option<usize>,
}

impl<'a> KeyblockBuilder<'a> {
    pub fn new(signer: &'a TestKey, data_key: &'a TestKey) -> Self {
        Self {
            signer,
            data_key,
            key_version: 1,
            flags: 0xf,
            signed_size: None,
        }
    }

    pub fn key_version(mut self, version: u32) -> Self {
        self.key_version = version;
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn signed_size(mut self, size: usize) -> Self {
        self.signed_size = Some(size);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let key = self.data_key.key_data();
        let key_end = Keyblock::SIZE + key.len();
        let signed = self.signed_size.unwrap_or(key_end);
        let hash_at = key_end;
        let sig_at = hash_at + 64;
        let sig_size = self.signer.sig_size();
        let total = sig_at + sig_size;

        let mut kb = Keyblock::new_zeroed();
        kb.magic = KEYBLOCK_MAGIC;
        kb.header_version_major = KEYBLOCK_VERSION_MAJOR;
        kb.header_version_minor = KEYBLOCK_VERSION_MINOR;
        kb.keyblock_size = total as u32;
        kb.keyblock_signature = Signature {
            sig_offset: (sig_at - Keyblock::SIGNATURE_OFFSET) as u32,
            sig_size: sig_size as u32,
            data_size: signed as u32,
            ..Signature::default()
        };
        kb.keyblock_hash = Signature {
            sig_offset: (hash_at - Keyblock::HASH_OFFSET) as u32,
            sig_size: 64,
            data_size: signed as u32,
            ..Signature::default()
        };
        kb.keyblock_flags = self.flags;
        kb.data_key = self
            .data_key
            .packed_header(Keyblock::SIZE - Keyblock::DATA_KEY_OFFSET, self.key_version);

        let mut buf = kb.as_bytes().to_vec();
        buf.extend_from_slice(&key);
        let hash = sha2::Sha512::digest(&buf[..signed]);
        buf.extend_from_slice(&hash);
        let sig = self.signer.sign(&buf[..signed]);
        buf.extend_from_slice(&sig);
        buf
    }
}

/// Legacy 2.1 firmware preamble signed by `data_key`, carrying
/// `kernel_subkey` and a signature over `body`
pub fn fw_preamble(data_key: &TestKey, version: u32, kernel_subkey: &TestKey, body: &[u8], flags: u32) -> Vec<u8> {
    let subkey = kernel_subkey.key_data();
    let body_sig = data_key.sign(body);
    let subkey_at = FwPreamble::SIZE;
    let body_sig_at = subkey_at + subkey.len();
    let signed = body_sig_at + body_sig.len();
    let sig_size = data_key.sig_size();
    let total = signed + sig_size;

    let mut pre = FwPreamble::new_zeroed();
    pre.preamble_size = total as u32;
    pre.preamble_signature = Signature {
        sig_offset: (signed - FwPreamble::SIGNATURE_OFFSET) as u32,
        sig_size: sig_size as u32,
        data_size: signed as u32,
        ..Signature::default()
    };
    pre.header_version_major = FW_PREAMBLE_VERSION_MAJOR;
    pre.header_version_minor = 1;
    pre.firmware_version = version;
    pre.kernel_subkey = kernel_subkey.packed_header(subkey_at - FwPreamble::KERNEL_SUBKEY_OFFSET, 1);
    pre.body_signature = Signature {
        sig_offset: (body_sig_at - FwPreamble::BODY_SIGNATURE_OFFSET) as u32,
        sig_size: body_sig.len() as u32,
        data_size: body.len() as u32,
        ..Signature::default()
    };
    pre.raw_flags = flags;

    let mut buf = pre.as_bytes().to_vec();
    buf.extend_from_slice(&subkey);
    buf.extend_from_slice(&body_sig);
    let sig = data_key.sign(&buf);
    buf.extend_from_slice(&sig);
    buf
}

/// Legacy 2.2 kernel preamble signed by `data_key` over `body`
pub fn kernel_preamble(data_key: &TestKey, version: u32, body: &[u8]) -> Vec<u8> {
    KernelPreambleBuilder::new(data_key, body).version(version).build()
}

/// Legacy kernel preamble of any minor version
///
/// The header is cut to the size its minor version defines, so fields a
/// shorter header lacks are simply absent from the signed bytes.
pub struct KernelPreambleBuilder<'a> {
    pub data_key: &'a TestKey,
    pub body: &'a [u8],
    pub version: u32,
    pub minor: u32,
    /// Bootloader address and size; defaults to the body's first 16 bytes
    pub bootloader: (u64, u32),
    pub vmlinuz_header: (u64, u32),
    /// Declared `preamble_size`; `None` declares the real size
    pub preamble_size: Option<u32>,
}

impl<'a> KernelPreambleBuilder<'a> {
    pub fn new(data_key: &'a TestKey, body: &'a [u8]) -> Self {
        Self {
            data_key,
            body,
            version: 1,
            minor: 2,
            bootloader: (BODY_LOAD_ADDRESS, body.len().min(16) as u32),
            vmlinuz_header: (0, 0),
            preamble_size: None,
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn minor(mut self, minor: u32) -> Self {
        self.minor = minor;
        self
    }

    pub fn bootloader(mut self, address: u64, size: u32) -> Self {
        self.bootloader = (address, size);
        self
    }

    pub fn vmlinuz_header(mut self, address: u64, size: u32) -> Self {
        self.vmlinuz_header = (address, size);
        self
    }

    pub fn preamble_size(mut self, size: u32) -> Self {
        self.preamble_size = Some(size);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let header_size = KernelPreamble::min_size(self.minor);
        let body_sig = self.data_key.sign(self.body);
        let body_sig_at = header_size;
        let signed = body_sig_at + body_sig.len();
        let sig_size = self.data_key.sig_size();
        let total = signed + sig_size;

        let mut pre = KernelPreamble::new_zeroed();
        pre.preamble_size = self.preamble_size.unwrap_or(total as u32);
        pre.preamble_signature = Signature {
            sig_offset: (signed - KernelPreamble::SIGNATURE_OFFSET) as u32,
            sig_size: sig_size as u32,
            data_size: signed as u32,
            ..Signature::default()
        };
        pre.header_version_major = KERNEL_PREAMBLE_VERSION_MAJOR;
        pre.header_version_minor = self.minor;
        pre.kernel_version = self.version;
        pre.body_load_address = U64::new(BODY_LOAD_ADDRESS);
        pre.bootloader_address = U64::new(self.bootloader.0);
        pre.bootloader_size = self.bootloader.1;
        pre.body_signature = Signature {
            sig_offset: (body_sig_at - KernelPreamble::BODY_SIGNATURE_OFFSET) as u32,
            sig_size: body_sig.len() as u32,
            data_size: self.body.len() as u32,
            ..Signature::default()
        };
        pre.raw_vmlinuz_header_address = U64::new(self.vmlinuz_header.0);
        pre.raw_vmlinuz_header_size = self.vmlinuz_header.1;

        let mut buf = pre.as_bytes()[..header_size].to_vec();
        buf.extend_from_slice(&body_sig);
        let sig = self.data_key.sign(&buf);
        buf.extend_from_slice(&sig);
        buf
    }
}

/// GBB holding `root` and `recovery` packed keys
pub fn gbb(root: &[u8], recovery: &[u8], flags: u32) -> Vec<u8> {
    let mut hdr = GbbHeader::new_zeroed();
    hdr.signature = GBB_MAGIC;
    hdr.major_version = GBB_VERSION_MAJOR;
    hdr.minor_version = 2;
    hdr.header_size = GbbHeader::SIZE as u32;
    hdr.flags = flags;
    hdr.rootkey_offset = GbbHeader::SIZE as u32;
    hdr.rootkey_size = root.len() as u32;
    hdr.recovery_key_offset = (GbbHeader::SIZE + root.len()) as u32;
    hdr.recovery_key_size = recovery.len() as u32;

    let mut buf = hdr.as_bytes().to_vec();
    buf.extend_from_slice(root);
    buf.extend_from_slice(recovery);
    buf
}

// ============================================================================
// v2.1 Structures
// ============================================================================

fn bare_sha256(data: &[u8], id: KeyId) -> Vec<u8> {
    let total = V21Signature::SIZE + 32;
    let sig = V21Signature {
        c: CommonHeader::new(MAGIC_SIGNATURE, V21_VERSION_MAJOR, V21Signature::SIZE as u32, total as u32),
        sig_offset: V21Signature::SIZE as u32,
        sig_size: 32,
        data_size: data.len() as u32,
        sig_alg: SignatureAlgorithm::None.as_raw(),
        hash_alg: HashAlgorithm::Sha256.as_raw(),
        id: *id.as_bytes(),
    };
    let mut buf = sig.as_bytes().to_vec();
    buf.extend_from_slice(&sha2::Sha256::digest(data));
    buf
}

/// v2.1 bare SHA-256 packed key
pub fn v21_bare_key(version: u32) -> Vec<u8> {
    let key = V21PackedKey {
        c: CommonHeader::new(
            MAGIC_PACKED_KEY,
            V21_VERSION_MAJOR,
            V21PackedKey::SIZE as u32,
            V21PackedKey::SIZE as u32,
        ),
        key_offset: V21PackedKey::SIZE as u32,
        key_size: 0,
        sig_alg: SignatureAlgorithm::None.as_raw(),
        hash_alg: HashAlgorithm::Sha256.as_raw(),
        key_version: version,
        id: *KeyId::NONE_SHA256.as_bytes(),
    };
    key.as_bytes().to_vec()
}

/// v2.1 key block carrying a bare SHA-256 data key, "signed" by its hash
pub fn v21_keyblock(key_version: u32) -> Vec<u8> {
    let data_key = v21_bare_key(key_version);
    let key_offset = V21Keyblock::SIZE;
    let sig_offset = key_offset + data_key.len();
    let total = sig_offset + V21Signature::SIZE + 32;

    let block = V21Keyblock {
        c: CommonHeader::new(MAGIC_KEYBLOCK, V21_VERSION_MAJOR, V21Keyblock::SIZE as u32, total as u32),
        flags: 0xf,
        key_offset: key_offset as u32,
        sig_count: 1,
        sig_offset: sig_offset as u32,
    };
    let mut buf = block.as_bytes().to_vec();
    buf.extend_from_slice(&data_key);
    let sig = bare_sha256(&buf, KeyId::NONE_SHA256);
    buf.extend_from_slice(&sig);
    buf
}

/// v2.1 firmware preamble with one body hash made for `body_id`
pub fn v21_fw_preamble(version: u32, body: &[u8], body_id: KeyId, flags: u32) -> Vec<u8> {
    let hash = bare_sha256(body, body_id);
    let hash_offset = V21FwPreamble::SIZE;
    let sig_offset = hash_offset + hash.len();
    let total = sig_offset + V21Signature::SIZE + 32;

    let pre = V21FwPreamble {
        c: CommonHeader::new(MAGIC_FW_PREAMBLE, V21_VERSION_MAJOR, V21FwPreamble::SIZE as u32, total as u32),
        flags,
        fw_version: version,
        hash_count: 1,
        hash_offset: hash_offset as u32,
        sig_offset: sig_offset as u32,
    };
    let mut buf = pre.as_bytes().to_vec();
    buf.extend_from_slice(&hash);
    let sig = bare_sha256(&buf, KeyId::NONE_SHA256);
    buf.extend_from_slice(&sig);
    buf
}

// ============================================================================
// Host
// ============================================================================

/// Host backed by in-memory flash images
#[derive(Default)]
pub struct TestHost {
    pub gbb: Vec<u8>,
    pub fw_vblock: Vec<u8>,
    pub kernel_vblock: Vec<u8>,
    /// Error returned by `tpm_clear_owner`
    pub tpm_error: Option<Error>,
    pub tpm_clears: usize,
    /// Offer a hashing engine
    pub offer_hw: bool,
    pub hw_inits: usize,
    pub(crate) hw: Option<DigestContext>,
}

impl HwCrypto for TestHost {
    fn hwcrypto_digest_init(&mut self, alg: HashAlgorithm, _data_size: u32) -> Result<()> {
        if !self.offer_hw {
            return Err(Error::ExHwCryptoUnsupported);
        }
        self.hw = Some(DigestContext::new(alg)?);
        self.hw_inits += 1;
        Ok(())
    }

    fn hwcrypto_digest_extend(&mut self, data: &[u8]) -> Result<()> {
        self.hw.as_mut().ok_or(Error::Unknown)?.extend(data);
        Ok(())
    }

    fn hwcrypto_digest_finalize(&mut self, digest: &mut [u8]) -> Result<()> {
        self.hw.take().ok_or(Error::Unknown)?.finalize(digest)?;
        Ok(())
    }
}

impl BootHost for TestHost {
    fn read_resource(&mut self, index: ResourceIndex, offset: u32, buf: &mut [u8]) -> Result<()> {
        let src = match index {
            ResourceIndex::Gbb => &self.gbb,
            ResourceIndex::FwVblock => &self.fw_vblock,
            ResourceIndex::KernelVblock => &self.kernel_vblock,
        };
        let start = offset as usize;
        let bytes = src.get(start..start + buf.len()).ok_or(Error::ExReadResourceSize)?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    fn tpm_clear_owner(&mut self) -> Result<()> {
        self.tpm_clears += 1;
        self.tpm_error.map_or(Ok(()), Err)
    }
}

// ============================================================================
// Images
// ============================================================================

pub const FW_BODY: &[u8] = b"read-write firmware body, signed by the firmware data key";
pub const KERNEL_BODY: &[u8] = b"kernel body: vmlinuz, command line and bootloader stub";

/// Parameters of a complete set of images
pub struct Images {
    pub fw_key_version: u32,
    pub fw_version: u32,
    pub fw_flags: u32,
    pub kernel_key_version: u32,
    pub kernel_version: u32,
    pub kernel_flags: u32,
    pub gbb_flags: u32,
}

impl Default for Images {
    fn default() -> Self {
        Self {
            fw_key_version: 2,
            fw_version: 3,
            fw_flags: 0,
            kernel_key_version: 4,
            kernel_version: 5,
            kernel_flags: vb_boot::wire::keyblock_flags::DEVELOPER_0
                | vb_boot::wire::keyblock_flags::RECOVERY_0,
            gbb_flags: 0,
        }
    }
}

impl Images {
    /// Host with legacy GBB, firmware vblock and kernel vblock
    pub fn host(&self, keys: &KeySet) -> TestHost {
        let mut fw_vblock = KeyblockBuilder::new(&keys.root, &keys.fw_data)
            .key_version(self.fw_key_version)
            .build();
        fw_vblock.extend(fw_preamble(&keys.fw_data, self.fw_version, &keys.kernel_subkey, FW_BODY, self.fw_flags));

        let mut kernel_vblock = KeyblockBuilder::new(&keys.kernel_subkey, &keys.kernel_data)
            .key_version(self.kernel_key_version)
            .flags(self.kernel_flags)
            .build();
        kernel_vblock.extend(kernel_preamble(&keys.kernel_data, self.kernel_version, KERNEL_BODY));

        TestHost {
            gbb: gbb(&keys.root.packed(1), &keys.recovery.packed(1), self.gbb_flags),
            fw_vblock,
            kernel_vblock,
            ..TestHost::default()
        }
    }
}
