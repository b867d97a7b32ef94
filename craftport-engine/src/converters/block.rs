use craftport_core::craft::Part;

use super::{BASE_ATTRIBUTES, ConverterKind, PartConverter};

const ADAPTIVE_STATE: &str = "Adaptive.State";

pub static BLOCK: PartConverter =
    PartConverter::new(ConverterKind::Block, "Block1", None, BASE_ATTRIBUTES);

pub(super) fn convert_block(part: &mut Part) {
    part.take_block(ADAPTIVE_STATE);
}

#[cfg(test)]
mod tests {
    use craftport_core::tree::Element;

    use super::*;
    use crate::converters::tests::part;

    #[test]
    fn adaptive_state_is_dropped_and_other_blocks_kept() {
        let mut part = part("2", "Block-1");
        part.children.push(Element::new(ADAPTIVE_STATE).with_attr("mode", "1"));
        part.children.push(Element::new("Fuel").with_attr("amount", "3"));
        BLOCK.convert(&mut part, 1.0).expect("convert block");

        assert!(part.block(ADAPTIVE_STATE).is_none());
        assert_eq!(part.block("Fuel").and_then(|fuel| fuel.attr("amount")), Some("3"));
        let names: Vec<_> = part.children.iter().map(|child| child.name.as_str()).collect();
        assert_eq!(names, ["Fuel", "Config", "Drag"]);
    }
}
