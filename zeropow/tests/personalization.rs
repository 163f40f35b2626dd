//! Digest generation checked against an independent Blake2b
//!
//! The reference below is a straight RFC 7693 transcription with a full
//! parameter block, sharing no code with the implementation under test.

use hex_literal::hex;
use zeropow::{seed_digest, Params};

const IV: [u64; 8] = [
    0x6a09e667f3bcc908,
    0xbb67ae8584caa73b,
    0x3c6ef372fe94f82b,
    0xa54ff53a5f1d36f1,
    0x510e527fade682d1,
    0x9b05688c2b3e6c1f,
    0x1f83d9abfb41bd6b,
    0x5be0cd19137e2179,
];

const SIGMA: [[usize; 16]; 12] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
];

fn g(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize, x: u64, y: u64) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}

fn compress(h: &mut [u64; 8], block: &[u8; 128], t: u128, last: bool) {
    let mut m = [0u64; 16];
    for (i, word) in m.iter_mut().enumerate() {
        *word = u64::from_le_bytes(block[i * 8..(i + 1) * 8].try_into().unwrap());
    }
    let mut v = [0u64; 16];
    v[..8].copy_from_slice(h);
    v[8..].copy_from_slice(&IV);
    v[12] ^= t as u64;
    v[13] ^= (t >> 64) as u64;
    if last {
        v[14] = !v[14];
    }
    for round in &SIGMA {
        g(&mut v, 0, 4, 8, 12, m[round[0]], m[round[1]]);
        g(&mut v, 1, 5, 9, 13, m[round[2]], m[round[3]]);
        g(&mut v, 2, 6, 10, 14, m[round[4]], m[round[5]]);
        g(&mut v, 3, 7, 11, 15, m[round[6]], m[round[7]]);
        g(&mut v, 0, 5, 10, 15, m[round[8]], m[round[9]]);
        g(&mut v, 1, 6, 11, 12, m[round[10]], m[round[11]]);
        g(&mut v, 2, 7, 8, 13, m[round[12]], m[round[13]]);
        g(&mut v, 3, 4, 9, 14, m[round[14]], m[round[15]]);
    }
    for i in 0..8 {
        h[i] ^= v[i] ^ v[i + 8];
    }
}

fn reference_blake2b(digest_len: usize, personal: &[u8; 16], input: &[u8]) -> Vec<u8> {
    let mut param = [0u8; 64];
    param[0] = digest_len as u8;
    param[2] = 1; // fanout
    param[3] = 1; // depth
    param[48..].copy_from_slice(personal);

    let mut h = IV;
    for (i, word) in h.iter_mut().enumerate() {
        *word ^= u64::from_le_bytes(param[i * 8..(i + 1) * 8].try_into().unwrap());
    }

    let mut t: u128 = 0;
    let mut offset = 0;
    while input.len() - offset > 128 {
        let block: &[u8; 128] = input[offset..offset + 128].try_into().unwrap();
        t += 128;
        compress(&mut h, block, t, false);
        offset += 128;
    }
    let mut block = [0u8; 128];
    let rem = input.len() - offset;
    block[..rem].copy_from_slice(&input[offset..]);
    t += rem as u128;
    compress(&mut h, &block, t, true);

    h.iter()
        .flat_map(|word| word.to_le_bytes())
        .take(digest_len)
        .collect()
}

fn reference_personal(n: u32, k: u32) -> [u8; 16] {
    let mut personal = [0u8; 16];
    personal[..8].copy_from_slice(b"ZERO_PoW");
    personal[8..12].copy_from_slice(&n.to_le_bytes());
    personal[12..].copy_from_slice(&k.to_le_bytes());
    personal
}

fn reference_seed_digest(n: u32, k: u32, header: &[u8], nonce: &[u8], index: u32) -> Vec<u8> {
    let mut input = Vec::new();
    input.extend_from_slice(header);
    input.extend_from_slice(nonce);
    input.extend_from_slice(&index.to_le_bytes());
    reference_blake2b(32, &reference_personal(n, k), &input)
}

/// The reference must reproduce the RFC 7693 test vectors before it is
/// allowed to judge anything else.
#[test]
fn reference_matches_rfc_vectors() {
    assert_eq!(
        reference_blake2b(64, &[0; 16], b""),
        hex!(
            "786a02f742015903c6c6fd852552d272912f4740e15847618a86e217f71f5419"
            "d25e1031afee585313896444934eb04b903a685b1448b755d56f701afe9be2ce"
        )
    );
    assert_eq!(
        reference_blake2b(64, &[0; 16], b"abc"),
        hex!(
            "ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d1"
            "7d87c5392aab792dc252d5de4533cc9518d38aa8dbf1925ab92386edd4009923"
        )
    );
}

#[test]
fn digest_matches_independent_reference() {
    let params = Params::EQUIHASH_192_7;
    let cases: &[(&[u8], &[u8], u32)] = &[
        (b"", b"", 0),
        (b"abc", b"", 1),
        (b"block header prefix", b"nonce bytes", 7),
        (&[0xff; 140], &[0x11; 32], 0x001f_ffff),
    ];
    for &(header, nonce, index) in cases {
        assert_eq!(
            seed_digest(&params, header, nonce, index).to_vec(),
            reference_seed_digest(192, 7, header, nonce, index),
            "header {header:?} nonce {nonce:?} index {index}"
        );
    }
}

/// Long inputs exercise the multi-block path of both implementations.
#[test]
fn digest_matches_reference_across_block_boundaries() {
    let params = Params::EQUIHASH_192_7;
    for len in [123, 124, 128, 129, 252, 256, 300] {
        let header = vec![0xa5u8; len];
        assert_eq!(
            seed_digest(&params, &header, b"n", 3).to_vec(),
            reference_seed_digest(192, 7, &header, b"n", 3),
            "header length {len}"
        );
    }
}

/// Digests are pure functions of their inputs.
#[test]
fn digests_are_deterministic() {
    let params = Params::EQUIHASH_192_7;
    let a = seed_digest(&params, b"header", b"nonce", 42);
    let b = seed_digest(&params, b"header", b"nonce", 42);
    assert_eq!(a, b);
    assert_ne!(a, seed_digest(&params, b"header", b"nonce", 43));
    assert_ne!(a, seed_digest(&params, b"header", b"nonce!", 42));
}

/// Changing n or k rebinds the personalization and must change every
/// digest.
#[test]
fn parameters_bind_the_digest() {
    let canonical = Params::EQUIHASH_192_7;
    let variants = [Params::new(96, 5, 10).unwrap(), Params::new(144, 5, 10).unwrap()];
    for index in [0u32, 1, 99] {
        let base = seed_digest(&canonical, b"same header", b"same nonce", index);
        for other in &variants {
            assert_ne!(
                base,
                seed_digest(other, b"same header", b"same nonce", index),
                "personalization failed to bind n={} k={}",
                other.n(),
                other.k()
            );
        }
    }
}
