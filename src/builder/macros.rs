//! Macros for declaring label types.

/// Generate a label enum: a fieldless enum usable as an automaton, state or
/// event id.
///
/// The generated type derives the traits every [`Label`](crate::core::Label)
/// needs, displays as its variant name and serializes as that same name. An
/// `ALL` constant lists the variants in declaration order.
///
/// # Example
///
/// ```
/// use baton::label_enum;
///
/// label_enum! {
///     pub enum Light {
///         Red,
///         Yellow,
///         Green,
///     }
/// }
///
/// assert_eq!(Light::Yellow.to_string(), "Yellow");
/// assert_eq!(Light::ALL.len(), 3);
/// ```
#[macro_export]
macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            #[allow(dead_code)]
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// The variant name.
            #[allow(dead_code)]
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.pad(self.name())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    label_enum! {
        enum Signal {
            ToPing,
            ToPong,
        }
    }

    #[test]
    fn label_enum_displays_variant_names() {
        assert_eq!(Signal::ToPing.to_string(), "ToPing");
        assert_eq!(Signal::ToPong.name(), "ToPong");
        assert_eq!(format!("{:?}", Signal::ToPong), "ToPong");
    }

    #[test]
    fn label_enum_lists_variants_in_order() {
        assert_eq!(Signal::ALL, &[Signal::ToPing, Signal::ToPong]);
    }

    #[test]
    fn label_enum_supports_visibility_and_attributes() {
        label_enum! {
            /// Ring positions.
            pub enum Position {
                #[allow(dead_code)]
                North,
                South,
            }
        }

        let position = Position::South;
        assert_eq!(position, Position::South);
        assert_eq!(serde_json::to_string(&position).unwrap(), "\"South\"");
    }
}
