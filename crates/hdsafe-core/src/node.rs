//! Hierarchical deterministic node (BIP-32, private derivation)
//!
//! An [`HdNode`] owns one [`SigningKey`], a 32-byte chain code and its path
//! metadata. Children are derived on demand and own independent buffers, so
//! a parent can be disposed without touching its children and vice versa.
//!
//! # Child derivation
//!
//! ```text
//! data = 0x00 || k_par || ser32(i)      (hardened, i >= 2^31)
//!      = serP(K_par) || ser32(i)         (normal)
//! I    = HMAC-SHA512(key = c_par, data)
//! k_i  = IL + k_par mod n                (IL >= n or k_i == 0: invalid index)
//! c_i  = IR
//! ```
//!
//! An invalid index is reported as `InvalidDerivationCandidate`; the caller
//! decides whether to try another index. Only
//! [`HdNode::derive_path_best_effort`] skips such steps.
//!
//! Path strings are parsed with `bitcoin::bip32`, see [`crate::path`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, OnceLock};

use bitcoin::bip32::{ChildNumber, Fingerprint};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::arith;
use crate::backend::{CurveBackend, Secp256k1Backend};
use crate::error::KeyError;
use crate::material::KeyMaterial;
use crate::path::{is_absolute, parse_path};
use crate::seed::{expand_seed, ChainCode};
use crate::signing::{Signer, SigningKey};

/// Size of the HMAC input for child derivation.
const CHILD_DATA_LEN: usize = 37;

pub struct HdNode<B: CurveBackend = Secp256k1Backend> {
    signing_key: SigningKey<B>,
    chain_code: ChainCode,
    path: Option<String>,
    index: u32,
    depth: u8,
    parent_fingerprint: Fingerprint,
    fingerprint: OnceLock<Fingerprint>,
}

/// Public metadata of a node. This is the only serializable view of a node
/// and it carries neither the scalar nor the chain code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub path: Option<String>,
    pub index: u32,
    pub depth: u8,
    /// Hex-encoded
    pub fingerprint: String,
    /// Hex-encoded
    pub parent_fingerprint: String,
    /// Hex-encoded compressed public key
    pub public_key: String,
}

impl HdNode<Secp256k1Backend> {
    /// Master node (depth 0, path `m`) from raw seed bytes.
    pub fn from_seed(seed: &[u8]) -> Result<Self, KeyError> {
        Self::from_seed_with_backend(seed, Arc::new(Secp256k1Backend::new()))
    }
}

impl<B: CurveBackend> HdNode<B> {
    pub fn from_seed_with_backend(seed: &[u8], backend: Arc<B>) -> Result<Self, KeyError> {
        let master = expand_seed(backend.as_ref(), seed)?;
        log::debug!("Created master node from {}-byte seed", seed.len());
        Ok(Self {
            signing_key: SigningKey::from_material(master.key_material, backend),
            chain_code: master.chain_code,
            path: Some("m".to_string()),
            index: 0,
            depth: 0,
            parent_fingerprint: Fingerprint::default(),
            fingerprint: OnceLock::new(),
        })
    }

    /// Importing serialized extended keys is not supported; nodes only come
    /// from a seed.
    pub fn from_extended_key(_extended_key: &str) -> Result<Self, KeyError> {
        Err(KeyError::UnsupportedOperation("extended key import"))
    }

    pub fn signing_key(&self) -> &SigningKey<B> {
        &self.signing_key
    }

    pub fn signing_key_mut(&mut self) -> &mut SigningKey<B> {
        &mut self.signing_key
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Raw index including the hardened bit.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> Fingerprint {
        self.parent_fingerprint
    }

    /// First four bytes of HASH160 of the compressed public key. Computed on
    /// first use and cached, so it stays readable after disposal.
    pub fn fingerprint(&self) -> Result<Fingerprint, KeyError> {
        if let Some(fp) = self.fingerprint.get() {
            return Ok(*fp);
        }
        let public_key = self.signing_key.public_key(true)?;
        let hash = self.signing_key.backend().hash160(&public_key);
        let fp = Fingerprint::from([hash[0], hash[1], hash[2], hash[3]]);
        Ok(*self.fingerprint.get_or_init(|| fp))
    }

    pub fn chain_code(&self) -> Result<&[u8; 32], KeyError> {
        if self.is_disposed() {
            return Err(KeyError::UseAfterDispose);
        }
        Ok(&self.chain_code)
    }

    pub fn public_key(&self, compressed: bool) -> Result<Vec<u8>, KeyError> {
        self.signing_key.public_key(compressed)
    }

    pub fn is_disposed(&self) -> bool {
        self.signing_key.is_disposed()
    }

    /// Derive the child at `index` (hardened when the top bit is set).
    ///
    /// The parent is only read; deriving siblings in any order, or
    /// concurrently, gives the same children.
    pub fn derive_child(&self, index: u32) -> Result<HdNode<B>, KeyError> {
        let hardened = ChildNumber::from(index).is_hardened();
        if self.is_disposed() {
            return Err(if hardened {
                KeyError::CannotDeriveFromNeutered
            } else {
                KeyError::UseAfterDispose
            });
        }
        let depth = self
            .depth
            .checked_add(1)
            .ok_or(KeyError::MaxDepthExceeded)?;

        let backend = self.signing_key.backend();
        let parent_scalar = self.signing_key.key_material().expose_secret()?;

        let mut data = Zeroizing::new([0u8; CHILD_DATA_LEN]);
        if hardened {
            data[1..33].copy_from_slice(parent_scalar);
        } else {
            let public_key = backend.public_key(parent_scalar, true)?;
            data[..33].copy_from_slice(&public_key);
        }
        data[33..].copy_from_slice(&index.to_be_bytes());

        let i = backend.hmac_sha512(&*self.chain_code, &*data);

        let mut child_scalar = Zeroizing::new([0u8; 32]);
        child_scalar.copy_from_slice(&i[..32]);
        if arith::compare_to_order(&child_scalar) != Ordering::Less {
            return Err(KeyError::InvalidDerivationCandidate { index });
        }
        arith::add_mod_order(&mut child_scalar, parent_scalar);
        if arith::is_zero(&child_scalar) {
            return Err(KeyError::InvalidDerivationCandidate { index });
        }

        let material = KeyMaterial::with_page_lock(&*child_scalar, backend.lock_key_pages())?;
        let mut chain_code = ChainCode::default();
        chain_code.copy_from_slice(&i[32..]);

        let path = self
            .path
            .as_ref()
            .map(|p| format!("{}/{}", p, ChildNumber::from(index)));
        let parent_fingerprint = self.fingerprint()?;

        log::debug!(
            "Derived child {} at depth {} (hardened: {})",
            path.as_deref().unwrap_or("<unknown path>"),
            depth,
            hardened
        );

        Ok(HdNode {
            signing_key: SigningKey::from_material(material, Arc::clone(backend)),
            chain_code,
            path,
            index,
            depth,
            parent_fingerprint,
            fingerprint: OnceLock::new(),
        })
    }

    /// Walk `path` one [`derive_child`](Self::derive_child) at a time.
    ///
    /// An `m/...` path may only be applied to a depth-0 node; a path without
    /// the `m` is taken relative to this node. Intermediate nodes are wiped
    /// as soon as the next step exists.
    pub fn derive_path(&self, path: &str) -> Result<HdNode<B>, KeyError> {
        let steps = self.resolve_path(path)?;
        let (first, rest) = split_steps(&steps)?;
        let mut node = self.derive_child(first)?;
        for &index in rest {
            node = node.derive_child(index)?;
        }
        Ok(node)
    }

    /// Like [`derive_path`](Self::derive_path), but a step whose candidate
    /// is invalid is skipped and the walk continues from the unchanged node.
    ///
    /// Fails with the last `InvalidDerivationCandidate` if no step succeeded.
    /// Every other error propagates.
    pub fn derive_path_best_effort(&self, path: &str) -> Result<HdNode<B>, KeyError> {
        let steps = self.resolve_path(path)?;
        let mut current: Option<HdNode<B>> = None;
        let mut last_skipped = None;

        for &step in &steps {
            let parent = current.as_ref().unwrap_or(self);
            match parent.derive_child(step) {
                Ok(child) => current = Some(child),
                Err(KeyError::InvalidDerivationCandidate { index }) => {
                    log::warn!("Skipping invalid derivation candidate at index {:#010x}", index);
                    last_skipped = Some(index);
                }
                Err(e) => return Err(e),
            }
        }

        match (current, last_skipped) {
            (Some(node), _) => Ok(node),
            (None, Some(index)) => Err(KeyError::InvalidDerivationCandidate { index }),
            (None, None) => Err(KeyError::InvalidPath("path has no steps".into())),
        }
    }

    /// Raw indices of `path`, hardened bit included.
    fn resolve_path(&self, path: &str) -> Result<Vec<u32>, KeyError> {
        if is_absolute(path) && self.depth != 0 {
            return Err(KeyError::InvalidPath(format!(
                "absolute path {} applied to node at depth {}",
                path.trim(),
                self.depth
            )));
        }
        let parsed = parse_path(path)?;
        let steps: &[ChildNumber] = parsed.as_ref();
        Ok(steps.iter().map(|&c| u32::from(c)).collect())
    }

    /// Wipe the scalar and chain code. Children already derived are not
    /// affected. Repeated calls are no-ops.
    pub fn dispose(&mut self) {
        if !self.is_disposed() {
            // Cache the public identifier while the key can still produce it
            if let Err(e) = self.fingerprint() {
                log::debug!("Fingerprint not cached before dispose: {}", e);
            }
        }
        self.signing_key.dispose();
        self.chain_code.zeroize();
    }

    pub fn info(&self) -> Result<NodeInfo, KeyError> {
        Ok(NodeInfo {
            path: self.path.clone(),
            index: self.index,
            depth: self.depth,
            fingerprint: self.fingerprint()?.to_string(),
            parent_fingerprint: self.parent_fingerprint.to_string(),
            public_key: hex::encode(self.public_key(true)?),
        })
    }
}

fn split_steps(steps: &[u32]) -> Result<(u32, &[u32]), KeyError> {
    steps
        .split_first()
        .map(|(&first, rest)| (first, rest))
        .ok_or_else(|| KeyError::InvalidPath("path has no steps".into()))
}

impl<B: CurveBackend> fmt::Debug for HdNode<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdNode")
            .field("path", &self.path)
            .field("index", &self.index)
            .field("depth", &self.depth)
            .field("parent_fingerprint", &self.parent_fingerprint.to_string())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
