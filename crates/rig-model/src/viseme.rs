//! Blend-shape channel tables and the phoneme → viseme map.
//!
//! Channel order is part of the contract with the host: weight buffers are
//! indexed in the order of these tables.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use mimic_common::{MimicError, MimicResult};

/// Eye-direction channels driven by the gaze coordinator, in buffer order.
pub const EYE_GAZE_CHANNELS: [&str; 4] = [
    "Expressions_eyesHoriz_min",
    "Expressions_eyesHoriz_max",
    "Expressions_eyesVert_min",
    "Expressions_eyesVert_max",
];

/// Eyelid channels driven by the blinker, in buffer order.
pub const EYELID_CHANNELS: [&str; 2] = ["Expressions_eyeClosedL_max", "Expressions_eyeClosedR_max"];

/// Index of each eye-direction channel in [`EYE_GAZE_CHANNELS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EyeChannel {
    Right = 0,
    Left = 1,
    Down = 2,
    Up = 3,
}

impl EyeChannel {
    pub const ALL: [EyeChannel; 4] = [Self::Right, Self::Left, Self::Down, Self::Up];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn blend_shape(self) -> &'static str {
        EYE_GAZE_CHANNELS[self.index()]
    }
}

/// Mouth visemes of the built-in set, in buffer order.
pub const MOUTH_VISEMES: [&str; 27] = [
    "phoneme_a_01",
    "phoneme_a_02",
    "phoneme_b_01",
    "phoneme_b_02",
    "phoneme_c_01",
    "phoneme_c_02",
    "phoneme_d_01",
    "phoneme_e_01",
    "phoneme_f_01",
    "phoneme_g_01",
    "phoneme_i_01",
    "phoneme_i_02",
    "phoneme_k_01",
    "phoneme_l_01",
    "phoneme_m_01",
    "phoneme_n_01",
    "phoneme_o_01",
    "phoneme_o_02",
    "phoneme_p_01",
    "phoneme_q_01",
    "phoneme_r_01",
    "phoneme_r_02",
    "phoneme_s_01",
    "phoneme_t_01",
    "phoneme_u_01",
    "phoneme_w_01",
    "phoneme_z_01",
];

/// Sentinel phoneme closing an utterance.
pub const END_OF_SEQUENCE: &str = "_";

/// Built-in phoneme map. `None` marks silence.
///
/// Symbols not listed here (`h`, `k`, `n`, `N`, `t`, `T`, `g`, ...) fall back
/// to [`MouthShape::Etc`].
const BUILTIN_PHONEMES: &[(&str, Option<&str>)] = &[
    ("gi", Some("phoneme_g_01")),
    ("ge", Some("phoneme_g_01")),
    ("ji", Some("phoneme_g_01")),
    ("c", Some("phoneme_g_01")),
    ("il", Some("phoneme_l_01")),
    ("el", Some("phoneme_l_01")),
    ("di", Some("phoneme_d_01")),
    ("eh", Some("phoneme_e_01")),
    ("ie", Some("phoneme_i_01")),
    ("ee", Some("phoneme_i_01")),
    ("sh", Some("phoneme_g_01")),
    ("sch", Some("phoneme_c_02")),
    // "e" reads better than a dedicated S shape
    ("s", Some("phoneme_e_01")),
    ("fv", Some("phoneme_f_01")),
    ("fw", Some("phoneme_f_01")),
    ("er", Some("phoneme_r_01")),
    ("o", Some("phoneme_o_01")),
    ("O", Some("phoneme_o_01")),
    ("ov", Some("phoneme_o_01")),
    ("oo", Some("phoneme_u_01")),
    ("oh", Some("phoneme_u_01")),
    ("mb", Some("phoneme_m_01")),
    ("p", Some("phoneme_p_01")),
    ("ah", Some("phoneme_a_01")),
    ("a", Some("phoneme_a_01")),
    ("{", Some("phoneme_e_01")),
    ("@U", Some("phoneme_o_01")),
    ("A", Some("phoneme_a_01")),
    ("AI", Some("phoneme_a_01")),
    ("aU", Some("phoneme_a_01")),
    ("b", Some("phoneme_b_02")),
    ("d", Some("phoneme_d_01")),
    ("D", Some("phoneme_d_01")),
    ("dZ", Some("phoneme_d_01")),
    ("E", Some("phoneme_e_01")),
    ("EI", Some("phoneme_i_01")),
    ("i", Some("phoneme_i_01")),
    ("I", Some("phoneme_i_01")),
    ("m", Some("phoneme_m_01")),
    ("f", Some("phoneme_f_01")),
    ("l", Some("phoneme_l_01")),
    ("r", Some("phoneme_r_01")),
    ("r=", Some("phoneme_r_01")),
    ("S", Some("phoneme_c_01")),
    ("u", Some("phoneme_u_01")),
    ("v", Some("phoneme_b_01")),
    ("V", Some("phoneme_o_01")),
    ("w", Some("phoneme_w_01")),
    ("z", Some("phoneme_z_01")),
    (END_OF_SEQUENCE, None),
];

static BUILTIN: Lazy<Arc<VisemeSet>> = Lazy::new(|| {
    let file = VisemeSetFile {
        visemes: MOUTH_VISEMES.iter().map(|s| s.to_string()).collect(),
        phonemes: BUILTIN_PHONEMES
            .iter()
            .map(|(p, v)| (p.to_string(), v.map(str::to_string)))
            .collect(),
    };
    // The static tables are consistent by construction.
    Arc::new(VisemeSet::from_parts(file).unwrap_or_else(|_| VisemeSet::empty()))
});

/// What a phoneme looks like on the mouth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "channel", rename_all = "snake_case")]
pub enum MouthShape {
    /// Drive this channel of the viseme set toward full weight.
    Channel(usize),
    /// Unmapped phoneme: no dedicated shape, all channels relax.
    Etc,
    /// End of sequence: mouth at rest.
    Silence,
}

impl MouthShape {
    /// The channel to ramp up, if any.
    pub fn channel(self) -> Option<usize> {
        match self {
            MouthShape::Channel(i) => Some(i),
            MouthShape::Etc | MouthShape::Silence => None,
        }
    }
}

/// On-disk form of a viseme set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisemeSetFile {
    /// Channel (blend-shape) names, in buffer order.
    pub visemes: Vec<String>,
    /// Phoneme symbol → channel name; `null` marks silence.
    #[serde(default)]
    pub phonemes: HashMap<String, Option<String>>,
}

/// Mouth channels plus the phoneme map resolving into them.
///
/// Immutable after construction, so one instance can be shared by every
/// sequencer in the process.
#[derive(Debug, Clone, PartialEq)]
pub struct VisemeSet {
    channels: Vec<String>,
    channel_index: HashMap<String, usize>,
    phonemes: HashMap<String, MouthShape>,
}

impl VisemeSet {
    /// The built-in 27-channel set.
    pub fn builtin() -> &'static VisemeSet {
        BUILTIN.as_ref()
    }

    /// Shared handle to the built-in set. Every caller gets the same instance.
    pub fn shared_builtin() -> Arc<VisemeSet> {
        Arc::clone(&BUILTIN)
    }

    /// Parse a viseme set from its JSON form.
    pub fn from_json(json: &str) -> MimicResult<Self> {
        let file: VisemeSetFile = serde_json::from_str(json)?;
        Self::from_parts(file)
    }

    /// Load a viseme set from a JSON file.
    pub fn from_file(path: &Path) -> MimicResult<Self> {
        if !path.exists() {
            return Err(MimicError::file_not_found(path));
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Build a set, checking that every phoneme targets a known channel.
    pub fn from_parts(file: VisemeSetFile) -> MimicResult<Self> {
        let mut channel_index = HashMap::with_capacity(file.visemes.len());
        for (i, name) in file.visemes.iter().enumerate() {
            if channel_index.insert(name.clone(), i).is_some() {
                return Err(MimicError::config(format!("duplicate viseme channel '{name}'")));
            }
        }

        let mut phonemes = HashMap::with_capacity(file.phonemes.len());
        for (phoneme, target) in file.phonemes {
            let shape = match target {
                None => MouthShape::Silence,
                Some(name) => match channel_index.get(&name) {
                    Some(&i) => MouthShape::Channel(i),
                    None => {
                        return Err(MimicError::config(format!(
                            "phoneme '{phoneme}' maps to unknown viseme '{name}'"
                        )))
                    }
                },
            };
            phonemes.insert(phoneme, shape);
        }

        Ok(Self {
            channels: file.visemes,
            channel_index,
            phonemes,
        })
    }

    fn empty() -> Self {
        Self {
            channels: Vec::new(),
            channel_index: HashMap::new(),
            phonemes: HashMap::new(),
        }
    }

    /// Export to the on-disk form.
    pub fn to_file(&self) -> VisemeSetFile {
        VisemeSetFile {
            visemes: self.channels.clone(),
            phonemes: self
                .phonemes
                .iter()
                .filter_map(|(p, shape)| match shape {
                    MouthShape::Channel(i) => Some((p.clone(), Some(self.channels[*i].clone()))),
                    MouthShape::Silence => Some((p.clone(), None)),
                    MouthShape::Etc => None,
                })
                .collect(),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn channel_name(&self, index: usize) -> Option<&str> {
        self.channels.get(index).map(String::as_str)
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channel_index.get(name).copied()
    }

    /// Resolve a phoneme symbol. Unknown symbols are not an error: they
    /// fall back to [`MouthShape::Etc`].
    pub fn shape_for(&self, phoneme: &str) -> MouthShape {
        self.phonemes
            .get(phoneme)
            .copied()
            .unwrap_or(MouthShape::Etc)
    }

    /// Human-readable label for a shape (`"etc"` / `"silence"` for non-channels).
    pub fn shape_label(&self, shape: MouthShape) -> &str {
        match shape {
            MouthShape::Channel(i) => self.channel_name(i).unwrap_or("?"),
            MouthShape::Etc => "etc",
            MouthShape::Silence => "silence",
        }
    }

    /// Channels of this set that the host mesh does not provide.
    pub fn missing_channels<'a, I>(&self, available: I) -> Vec<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let available: std::collections::HashSet<&str> = available.into_iter().collect();
        self.channels
            .iter()
            .map(String::as_str)
            .filter(|c| !available.contains(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_builtin_is_one_instance() {
        let a = VisemeSet::shared_builtin();
        let b = VisemeSet::shared_builtin();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(std::ptr::eq(a.as_ref(), VisemeSet::builtin()));
    }

    #[test]
    fn test_builtin_set_has_all_mouth_channels() {
        let set = VisemeSet::builtin();
        assert_eq!(set.channel_count(), 27);
        assert_eq!(set.channel_name(0), Some("phoneme_a_01"));
        assert_eq!(set.channel_index("phoneme_z_01"), Some(26));
    }

    #[test]
    fn test_builtin_phoneme_mapping() {
        let set = VisemeSet::builtin();
        assert_eq!(
            set.shape_for("a"),
            MouthShape::Channel(set.channel_index("phoneme_a_01").unwrap())
        );
        assert_eq!(
            set.shape_for("b"),
            MouthShape::Channel(set.channel_index("phoneme_b_02").unwrap())
        );
        assert_eq!(
            set.shape_for("s"),
            MouthShape::Channel(set.channel_index("phoneme_e_01").unwrap())
        );
        assert_eq!(set.shape_for(END_OF_SEQUENCE), MouthShape::Silence);
    }

    #[test]
    fn test_unknown_phoneme_falls_back_to_etc() {
        let set = VisemeSet::builtin();
        assert_eq!(set.shape_for("k"), MouthShape::Etc);
        assert_eq!(set.shape_for("x-unknown"), MouthShape::Etc);
        assert_eq!(MouthShape::Etc.channel(), None);
    }

    #[test]
    fn test_custom_set_from_json() {
        let json = r#"{
            "visemes": ["open", "closed"],
            "phonemes": {"a": "open", "m": "closed", "_": null}
        }"#;
        let set = VisemeSet::from_json(json).unwrap();
        assert_eq!(set.channel_count(), 2);
        assert_eq!(set.shape_for("m"), MouthShape::Channel(1));
        assert_eq!(set.shape_for("_"), MouthShape::Silence);
        assert_eq!(set.shape_label(MouthShape::Channel(0)), "open");
    }

    #[test]
    fn test_custom_set_rejects_unknown_target() {
        let json = r#"{"visemes": ["open"], "phonemes": {"a": "wide"}}"#;
        assert!(matches!(
            VisemeSet::from_json(json),
            Err(MimicError::Config { .. })
        ));
    }

    #[test]
    fn test_custom_set_rejects_duplicate_channels() {
        let json = r#"{"visemes": ["open", "open"]}"#;
        assert!(VisemeSet::from_json(json).is_err());
    }

    #[test]
    fn test_missing_channels() {
        let set = VisemeSet::builtin();
        let mesh: Vec<&str> = MOUTH_VISEMES.iter().copied().filter(|c| *c != "phoneme_q_01").collect();
        assert_eq!(set.missing_channels(mesh), vec!["phoneme_q_01"]);
    }

    #[test]
    fn test_to_file_roundtrip_preserves_mapping() {
        let set = VisemeSet::builtin();
        let rebuilt = VisemeSet::from_parts(set.to_file()).unwrap();
        assert_eq!(&rebuilt, set);
    }

    #[test]
    fn test_eye_channel_order() {
        assert_eq!(EyeChannel::Up.index(), 3);
        assert_eq!(EyeChannel::Right.blend_shape(), "Expressions_eyesHoriz_min");
    }
}
