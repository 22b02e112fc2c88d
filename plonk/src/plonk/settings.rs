use crate::errors::{PlonkError, Result};
use crate::plonk::{
    transcript::{
        HashType, Manifest, ManifestEntry, RoundManifest, ALPHA_CHALLENGE, BETA_CHALLENGE,
        EVALUATION_CHALLENGE, GAMMA_CHALLENGE, INIT_CHALLENGE, NU_CHALLENGE, SEPARATOR_CHALLENGE,
    },
    widgets::{WidgetFlags, WidgetKind},
};
use ark_std::{fmt, format, str::FromStr, string::String, vec::Vec};
use waffle_algebra::prelude::*;

/// The named protocol variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantTag {
    /// Width-3 arithmetic gates, linearised, Keccak challenges.
    Standard,
    /// Width-3 arithmetic gates, unrolled, Blake2s challenges.
    StandardUnrolled,
    /// Width-4 turbo gates, linearised, Keccak challenges.
    Turbo,
    /// Width-4 turbo gates, unrolled, Blake2s challenges.
    TurboUnrolled,
}

impl VariantTag {
    /// Return every registered tag.
    pub fn all() -> [VariantTag; 4] {
        [
            VariantTag::Standard,
            VariantTag::StandardUnrolled,
            VariantTag::Turbo,
            VariantTag::TurboUnrolled,
        ]
    }

    /// Return the tag string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantTag::Standard => "standard",
            VariantTag::StandardUnrolled => "standard-unrolled",
            VariantTag::Turbo => "turbo",
            VariantTag::TurboUnrolled => "turbo-unrolled",
        }
    }

    fn is_unrolled(&self) -> bool {
        matches!(self, VariantTag::StandardUnrolled | VariantTag::TurboUnrolled)
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariantTag {
    type Err = PlonkError;

    fn from_str(s: &str) -> Result<Self> {
        VariantTag::all()
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PlonkError::UnknownVariant(s.into()))
    }
}

/// A fully resolved protocol configuration. It must mirror the prover's
/// configuration exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVariant {
    /// The registered tag, `None` for custom variants.
    pub tag: Option<VariantTag>,
    /// The challenge hash.
    pub hash_type: HashType,
    /// Width of every challenge in bytes.
    pub num_challenge_bytes: usize,
    /// Fold selectors into the linearisation polynomial.
    pub use_linearisation: bool,
    /// Read the identity permutation from committed polynomials.
    pub use_identity_polynomials: bool,
    /// Wires per gate.
    pub program_width: usize,
    /// The constraint families, in the prover's order.
    pub widgets: Vec<WidgetKind>,
}

/// Return the registered variant for `tag`.
pub fn resolve(tag: &str) -> Result<ProtocolVariant> {
    Ok(ProtocolVariant::from_tag(tag.parse()?))
}

impl ProtocolVariant {
    /// Return the registered variant for `tag`.
    pub fn from_tag(tag: VariantTag) -> Self {
        use WidgetKind::*;

        let (program_width, widgets) = match tag {
            VariantTag::Standard | VariantTag::StandardUnrolled => {
                (3, vec![Permutation, Arithmetic])
            }
            VariantTag::Turbo | VariantTag::TurboUnrolled => (
                4,
                vec![
                    Permutation,
                    TurboArithmetic,
                    TurboFixedBase,
                    TurboRange,
                    TurboLogic,
                ],
            ),
        };
        let (hash_type, num_challenge_bytes) = if tag.is_unrolled() {
            (HashType::PedersenBlake2s, 16)
        } else {
            (HashType::Keccak256, 32)
        };

        Self {
            tag: Some(tag),
            hash_type,
            num_challenge_bytes,
            use_linearisation: !tag.is_unrolled(),
            use_identity_polynomials: false,
            program_width,
            widgets,
        }
    }

    /// Assemble a variant from a widget list, e.g. to bring in the elliptic
    /// widget. Identity polynomials stay off.
    pub fn custom(
        hash_type: HashType,
        num_challenge_bytes: usize,
        use_linearisation: bool,
        program_width: usize,
        widgets: &[WidgetKind],
    ) -> Result<Self> {
        let variant = Self {
            tag: None,
            hash_type,
            num_challenge_bytes,
            use_linearisation,
            use_identity_polynomials: false,
            program_width,
            widgets: widgets.to_vec(),
        };
        variant.validate()?;
        Ok(variant)
    }

    /// Check the widget list against the configuration.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(PlonkError::InvalidVariant(msg));

        if self.num_challenge_bytes == 0 || self.num_challenge_bytes > self.hash_type.output_len()
        {
            return invalid(format!(
                "{} challenge bytes with {:?}",
                self.num_challenge_bytes, self.hash_type
            ));
        }
        if !(3..=4).contains(&self.program_width) {
            return invalid(format!("program width {}", self.program_width));
        }
        match self.widgets.first() {
            None => return invalid("no widgets".into()),
            Some(WidgetKind::Permutation) => {}
            Some(first) => return invalid(format!("{:?} precedes the permutation", first)),
        }

        let flags = self.flags();
        let mut seen: Vec<WidgetKind> = Vec::with_capacity(self.widgets.len());
        let mut raw_openings: Vec<String> = Vec::new();
        for kind in self.widgets.iter() {
            if seen.contains(kind) {
                return invalid(format!("{:?} appears twice", kind));
            }
            seen.push(*kind);

            if kind.min_program_width() > self.program_width {
                return invalid(format!(
                    "{:?} needs width {}",
                    kind,
                    kind.min_program_width()
                ));
            }
            for label in kind.raw_openings(self.program_width, flags) {
                if raw_openings.contains(&label) {
                    return invalid(format!("{} is opened twice", label));
                }
                raw_openings.push(label);
            }
        }
        Ok(())
    }

    /// Return the flags the widgets are applied under.
    pub fn flags(&self) -> WidgetFlags {
        WidgetFlags {
            use_linearisation: self.use_linearisation,
            use_identity_polynomials: self.use_identity_polynomials,
        }
    }

    /// Return the separation challenges, in widget order.
    pub fn separation_challenges(&self) -> Vec<&'static str> {
        self.widgets
            .iter()
            .filter_map(|w| w.separation_challenge())
            .collect()
    }

    /// Return the evaluations the prover sends, in first-use order. The
    /// linearisation polynomial `r` comes last.
    pub fn evaluation_labels(&self) -> Vec<String> {
        let flags = self.flags();
        let mut labels: Vec<String> = Vec::new();
        for label in self
            .widgets
            .iter()
            .flat_map(|w| w.required_evaluations(self.program_width, flags))
        {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        if self.use_linearisation {
            labels.push("r".into());
        }
        labels
    }

    /// Return the evaluations whose opening terms the widgets emit themselves.
    pub fn raw_openings(&self) -> Vec<String> {
        let flags = self.flags();
        self.widgets
            .iter()
            .flat_map(|w| w.raw_openings(self.program_width, flags))
            .collect()
    }

    /// Return the manifest the prover follows for a circuit with
    /// `num_public_inputs` public inputs.
    pub fn create_manifest<G: Group>(&self, num_public_inputs: usize) -> Manifest {
        let scalar_len = G::ScalarType::bytes_len();
        let commitment_len = G::COMPRESSED_LEN;
        let width = self.program_width;
        let labelled = |prefix: &str, len: usize| -> Vec<ManifestEntry> {
            (1..=width)
                .map(|i| ManifestEntry::new(&format!("{}_{}", prefix, i), len))
                .collect()
        };

        let mut wire_round = vec![ManifestEntry::new(
            "public_inputs",
            scalar_len * num_public_inputs,
        )];
        wire_round.extend(labelled("W", commitment_len));

        let mut alpha_round: Vec<String> = vec![ALPHA_CHALLENGE.into()];
        alpha_round.extend(self.separation_challenges().into_iter().map(String::from));

        let mut evaluation_round = vec![ManifestEntry {
            name: "t".into(),
            num_bytes: scalar_len,
            derived_by_verifier: true,
        }];
        evaluation_round.extend(
            self.evaluation_labels()
                .iter()
                .map(|l| ManifestEntry::new(l, scalar_len)),
        );

        Manifest {
            rounds: vec![
                RoundManifest {
                    elements: vec![
                        ManifestEntry::new("circuit_size", 4),
                        ManifestEntry::new("public_input_size", 4),
                    ],
                    challenges: vec![INIT_CHALLENGE.into()],
                    map_challenge: false,
                },
                RoundManifest {
                    elements: wire_round,
                    challenges: vec![BETA_CHALLENGE.into(), GAMMA_CHALLENGE.into()],
                    map_challenge: false,
                },
                RoundManifest {
                    elements: vec![ManifestEntry::new("Z", commitment_len)],
                    challenges: alpha_round,
                    map_challenge: false,
                },
                RoundManifest {
                    elements: labelled("T", commitment_len),
                    challenges: vec![EVALUATION_CHALLENGE.into()],
                    map_challenge: false,
                },
                RoundManifest {
                    elements: evaluation_round,
                    challenges: vec![NU_CHALLENGE.into()],
                    map_challenge: true,
                },
                RoundManifest {
                    elements: vec![
                        ManifestEntry::new("PI_Z", commitment_len),
                        ManifestEntry::new("PI_Z_OMEGA", commitment_len),
                    ],
                    challenges: vec![SEPARATOR_CHALLENGE.into()],
                    map_challenge: false,
                },
            ],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use waffle_algebra::bn254::BN254G1;

    #[test]
    fn registry() {
        let standard = resolve("standard").unwrap();
        assert_eq!(standard.hash_type, HashType::Keccak256);
        assert_eq!(standard.num_challenge_bytes, 32);
        assert!(standard.use_linearisation);
        assert_eq!(
            standard.widgets,
            vec![WidgetKind::Permutation, WidgetKind::Arithmetic]
        );

        let turbo = resolve("turbo-unrolled").unwrap();
        assert_eq!(turbo.hash_type, HashType::PedersenBlake2s);
        assert_eq!(turbo.num_challenge_bytes, 16);
        assert!(!turbo.use_linearisation);
        assert_eq!(turbo.program_width, 4);
        assert_eq!(turbo.widgets.len(), 5);

        for tag in VariantTag::all() {
            let variant = ProtocolVariant::from_tag(tag);
            assert!(!variant.use_identity_polynomials);
            assert!(variant.validate().is_ok());
            assert_eq!(tag.to_string().parse::<VariantTag>().unwrap(), tag);
        }
    }

    #[test]
    fn unknown_tag() {
        assert_eq!(
            resolve("ultra"),
            Err(PlonkError::UnknownVariant("ultra".into()))
        );
        assert_eq!(resolve("Turbo").unwrap().tag, Some(VariantTag::Turbo));
    }

    #[test]
    fn tag_serde() {
        let json = serde_json::to_string(&VariantTag::StandardUnrolled).unwrap();
        assert_eq!(json, "\"standard-unrolled\"");
        let tag: VariantTag = serde_json::from_str("\"turbo\"").unwrap();
        assert_eq!(tag, VariantTag::Turbo);
    }

    #[test]
    fn custom_variants_are_validated() {
        use WidgetKind::*;
        let custom = |width, widgets: &[WidgetKind]| {
            ProtocolVariant::custom(HashType::Keccak256, 32, false, width, widgets)
        };

        assert!(custom(4, &[Permutation, TurboArithmetic, Elliptic]).is_ok());
        assert!(matches!(custom(4, &[]), Err(PlonkError::InvalidVariant(_))));
        assert!(matches!(
            custom(4, &[TurboArithmetic, Permutation]),
            Err(PlonkError::InvalidVariant(_))
        ));
        assert!(matches!(
            custom(4, &[Permutation, TurboRange, TurboRange]),
            Err(PlonkError::InvalidVariant(_))
        ));
        assert!(matches!(
            custom(3, &[Permutation, TurboLogic]),
            Err(PlonkError::InvalidVariant(_))
        ));
        assert!(matches!(
            custom(5, &[Permutation]),
            Err(PlonkError::InvalidVariant(_))
        ));
        // both open q_m, q_1, .. themselves
        assert!(matches!(
            custom(4, &[Permutation, Arithmetic, TurboArithmetic]),
            Err(PlonkError::InvalidVariant(_))
        ));
        assert!(matches!(
            ProtocolVariant::custom(HashType::PedersenBlake2s, 33, true, 4, &[Permutation]),
            Err(PlonkError::InvalidVariant(_))
        ));
    }

    #[test]
    fn manifest_rounds() {
        let variant = resolve("turbo").unwrap();
        let manifest = variant.create_manifest::<BN254G1>(2);
        assert_eq!(manifest.rounds.len(), 6);
        assert_eq!(
            manifest.rounds[2].challenges,
            vec![
                "alpha",
                "permutation_separation",
                "fixed_base_separation",
                "range_separation",
                "logic_separation"
            ]
        );
        assert_eq!(manifest.rounds[1].elements[0].num_bytes, 64);
        assert!(manifest.rounds[4].map_challenge);

        let evaluations: Vec<&str> = manifest.rounds[4]
            .elements
            .iter()
            .filter(|e| !e.derived_by_verifier)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(evaluations.last(), Some(&"r"));
        let unique: ark_std::collections::BTreeSet<&&str> = evaluations.iter().collect();
        assert_eq!(unique.len(), evaluations.len());
        assert!(evaluations.contains(&"q_arith"));
        assert!(evaluations.contains(&"w_4_omega"));
        assert!(!evaluations.contains(&"q_m"));

        let unrolled = resolve("standard-unrolled").unwrap();
        let labels = unrolled.evaluation_labels();
        assert!(labels.contains(&"q_m".to_string()));
        assert!(labels.contains(&"sigma_3".to_string()));
        assert!(!labels.contains(&"r".to_string()));
        assert_eq!(unrolled.raw_openings().len(), 9);
    }
}
