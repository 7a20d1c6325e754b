//! Static registry of reference-bearing elements
//!
//! Maps element qualified names to the attributes that carry relationship
//! ids, so the part graph copier knows what to rewrite. Built once,
//! immutable, passed by reference; there is no runtime mutation.

/// Policy when the slot's value has no relationship on the source part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Hard failure: the merge aborts
    Fail,
    /// Best-effort degrade: strip the attribute (hyperlink actions)
    StripAttribute,
}

/// One reference-carrying attribute on an element kind. Whether the
/// value names an in-package payload or an outside target is decided by
/// the resolved relationship, not declared here.
#[derive(Debug)]
pub struct RefSlot {
    pub attr: &'static str,
    pub on_missing: MissingPolicy,
}

/// All reference slots of one element kind
#[derive(Debug)]
pub struct RefRule {
    pub element: &'static str,
    pub slots: &'static [RefSlot],
}

const EMBED: RefSlot = RefSlot {
    attr: "r:embed",
    on_missing: MissingPolicy::Fail,
};
const LINK: RefSlot = RefSlot {
    attr: "r:link",
    on_missing: MissingPolicy::Fail,
};
const ID_EMBED: RefSlot = RefSlot {
    attr: "r:id",
    on_missing: MissingPolicy::Fail,
};
const ID_HYPERLINK: RefSlot = RefSlot {
    attr: "r:id",
    on_missing: MissingPolicy::StripAttribute,
};

/// The full registry. Multi-slot entries (diagram relIds) list every
/// attribute that may carry a reference.
pub static REF_RULES: &[RefRule] = &[
    RefRule {
        element: "a:blip",
        slots: &[EMBED, LINK],
    },
    RefRule {
        element: "a:hlinkClick",
        slots: &[ID_HYPERLINK],
    },
    RefRule {
        element: "a:hlinkHover",
        slots: &[ID_HYPERLINK],
    },
    RefRule {
        element: "a:audioFile",
        slots: &[LINK],
    },
    RefRule {
        element: "a:videoFile",
        slots: &[LINK],
    },
    RefRule {
        element: "a:quickTimeFile",
        slots: &[LINK],
    },
    RefRule {
        element: "a:wavAudioFile",
        slots: &[EMBED],
    },
    RefRule {
        element: "a:snd",
        slots: &[EMBED],
    },
    RefRule {
        element: "c:chart",
        slots: &[ID_EMBED],
    },
    RefRule {
        element: "dgm:relIds",
        slots: &[
            RefSlot {
                attr: "r:dm",
                on_missing: MissingPolicy::Fail,
            },
            RefSlot {
                attr: "r:lo",
                on_missing: MissingPolicy::Fail,
            },
            RefSlot {
                attr: "r:qs",
                on_missing: MissingPolicy::Fail,
            },
            RefSlot {
                attr: "r:cs",
                on_missing: MissingPolicy::Fail,
            },
        ],
    },
    RefRule {
        element: "p:oleObj",
        slots: &[ID_EMBED],
    },
    RefRule {
        element: "p:control",
        slots: &[ID_EMBED],
    },
    RefRule {
        element: "ax:ocx",
        slots: &[ID_EMBED],
    },
    // VML image fills reference media through either attribute
    RefRule {
        element: "v:imagedata",
        slots: &[
            ID_EMBED,
            RefSlot {
                attr: "o:relid",
                on_missing: MissingPolicy::Fail,
            },
        ],
    },
    // Embedded font payloads referenced from p:embeddedFontLst
    RefRule {
        element: "p:regular",
        slots: &[ID_EMBED],
    },
    RefRule {
        element: "p:bold",
        slots: &[ID_EMBED],
    },
    RefRule {
        element: "p:italic",
        slots: &[ID_EMBED],
    },
    RefRule {
        element: "p:boldItalic",
        slots: &[ID_EMBED],
    },
];

/// Look up the rule for an element, if it carries references
pub fn rule_for(element: &str) -> Option<&'static RefRule> {
    REF_RULES.iter().find(|r| r.element == element)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blip_has_embed_and_link() {
        let rule = rule_for("a:blip").unwrap();
        let attrs: Vec<_> = rule.slots.iter().map(|s| s.attr).collect();
        assert_eq!(attrs, vec!["r:embed", "r:link"]);
    }

    #[test]
    fn test_hyperlink_degrades() {
        let rule = rule_for("a:hlinkClick").unwrap();
        assert_eq!(rule.slots[0].on_missing, MissingPolicy::StripAttribute);
    }

    #[test]
    fn test_diagram_is_multi_slot() {
        let rule = rule_for("dgm:relIds").unwrap();
        assert_eq!(rule.slots.len(), 4);
        assert!(rule.slots.iter().all(|s| s.on_missing == MissingPolicy::Fail));
    }

    #[test]
    fn test_unknown_element_has_no_rule() {
        assert!(rule_for("p:sp").is_none());
    }
}
