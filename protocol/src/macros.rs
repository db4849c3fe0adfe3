//! Declarative helpers for the object model.
//!
//! Field order on the wire is the order fields are written in the macro
//! invocation, and nothing else. Reordering a struct here changes every
//! digest that includes it.

/// Declares a struct whose canonical encoding is the concatenation of its
/// fields in declaration order, and whose JSON form is the obvious object.
///
/// Field attributes (`#[serde(...)]`, doc comments) pass through untouched.
macro_rules! graphene_object {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                pub $field:ident : $ty:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )+
        }

        impl $crate::codec::Encode for $name {
            fn encode(&self, out: &mut Vec<u8>) {
                $( $crate::codec::Encode::encode(&self.$field, out); )+
            }
        }

        impl $crate::codec::Decode for $name {
            fn decode(
                reader: &mut $crate::codec::Reader<'_>,
            ) -> Result<Self, $crate::codec::CodecError> {
                // Struct expressions evaluate fields in the order written.
                Ok(Self {
                    $( $field: $crate::codec::Decode::decode(reader)?, )+
                })
            }
        }
    };
}

/// Declares an extension bag: a set of optional fields, each with a fixed
/// index.
///
/// Wire form is a static-variant array holding only the present fields, in
/// index order. JSON form is `[]` when empty (what the node itself accepts
/// for an empty extension) and an object of the present fields otherwise.
macro_rules! extension_bag {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $index:literal => $field:ident : $ty:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: Option<$ty>,
            )+
        }

        impl $name {
            /// Whether no extension is set.
            pub fn is_empty(&self) -> bool {
                true $( && self.$field.is_none() )+
            }

            fn present(&self) -> u64 {
                0 $( + u64::from(self.$field.is_some()) )+
            }
        }

        impl $crate::codec::Encode for $name {
            fn encode(&self, out: &mut Vec<u8>) {
                $crate::codec::encode_varint(self.present(), out);
                $(
                    if let Some(value) = &self.$field {
                        $crate::codec::encode_varint($index, out);
                        $crate::codec::Encode::encode(value, out);
                    }
                )+
            }
        }

        impl $crate::codec::Decode for $name {
            fn decode(
                reader: &mut $crate::codec::Reader<'_>,
            ) -> Result<Self, $crate::codec::CodecError> {
                let count = reader.read_length()?;
                let mut bag = Self::default();
                for _ in 0..count {
                    let offset = reader.offset();
                    let tag = reader.read_varint()?;
                    match tag {
                        $(
                            $index => {
                                bag.$field = Some($crate::codec::Decode::decode(reader)?);
                            }
                        )+
                        other => {
                            return Err($crate::codec::CodecError::UnknownTag {
                                offset,
                                tag: other,
                                type_name: stringify!($name),
                            })
                        }
                    }
                }
                Ok(bag)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                use serde::ser::{SerializeMap, SerializeSeq};
                if self.is_empty() {
                    return serializer.serialize_seq(Some(0))?.end();
                }
                let mut map = serializer.serialize_map(Some(self.present() as usize))?;
                $(
                    if let Some(value) = &self.$field {
                        map.serialize_entry(stringify!($field), value)?;
                    }
                )+
                map.end()
            }
        }

        const _: () = {
            #[derive(serde::Deserialize)]
            #[serde(deny_unknown_fields)]
            struct Fields {
                $(
                    #[serde(default)]
                    $field: Option<$ty>,
                )+
            }

            #[derive(serde::Deserialize)]
            #[serde(untagged)]
            enum Raw {
                Empty(Vec<serde::de::IgnoredAny>),
                Object(Fields),
            }

            impl<'de> serde::Deserialize<'de> for $name {
                fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    match Raw::deserialize(deserializer)? {
                        Raw::Empty(items) if items.is_empty() => Ok(Self::default()),
                        Raw::Empty(_) => Err(serde::de::Error::custom(concat!(
                            stringify!($name),
                            " must be an object or an empty array"
                        ))),
                        Raw::Object(fields) => Ok(Self {
                            $( $field: fields.$field, )+
                        }),
                    }
                }
            }
        };
    };
}
