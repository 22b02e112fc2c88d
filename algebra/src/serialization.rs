use crate::prelude::*;

/// Byte encoding shared by every scalar and group element that is shipped inside
/// keys and transcripts.
pub trait WaffleFromToBytes: Sized {
    /// Convert to bytes.
    fn waffle_to_bytes(&self) -> Result<Vec<u8>>;
    /// Reconstruct from bytes.
    fn waffle_from_bytes(bytes: &[u8]) -> Result<Self>;
}

/// Serde glue over [`WaffleFromToBytes`]: base64 strings for human readable
/// formats, raw bytes otherwise.
#[macro_export]
macro_rules! serialize_deserialize {
    ($t:ident) => {
        impl ::serde::Serialize for $t {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                let bytes = $crate::serialization::WaffleFromToBytes::waffle_to_bytes(self)
                    .map_err(::serde::ser::Error::custom)?;
                if serializer.is_human_readable() {
                    serializer.serialize_str(&$crate::utils::b64enc(&bytes))
                } else {
                    serializer.serialize_bytes(&bytes)
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let bytes = if deserializer.is_human_readable() {
                    deserializer.deserialize_str($crate::serialization::obj_serde::BytesVisitor)?
                } else {
                    deserializer.deserialize_bytes($crate::serialization::obj_serde::BytesVisitor)?
                };
                <$t as $crate::serialization::WaffleFromToBytes>::waffle_from_bytes(&bytes)
                    .map_err(::serde::de::Error::custom)
            }
        }
    };
}

/// The byte visitor behind [`serialize_deserialize`].
pub mod obj_serde {
    use crate::prelude::*;
    use serde::de::{SeqAccess, Visitor};

    /// Collects either raw bytes, a byte sequence or a base64 string.
    pub struct BytesVisitor;

    impl<'de> Visitor<'de> for BytesVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, formatter: &mut Formatter<'_>) -> core::fmt::Result {
            formatter.write_str("a valid WaffleFromToBytes object")
        }

        fn visit_seq<V>(self, mut seq: V) -> core::result::Result<Vec<u8>, V::Error>
        where
            V: SeqAccess<'de>,
        {
            let mut vec: Vec<u8> = vec![];
            while let Some(x) = seq.next_element()? {
                vec.push(x);
            }
            Ok(vec)
        }

        fn visit_bytes<E>(self, v: &[u8]) -> core::result::Result<Vec<u8>, E> {
            Ok(v.to_vec())
        }

        fn visit_str<E>(self, v: &str) -> core::result::Result<Vec<u8>, E>
        where
            E: serde::de::Error,
        {
            b64dec(v).map_err(serde::de::Error::custom)
        }
    }
}
