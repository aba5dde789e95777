//! Inline picture markup.

use docfill_core::InlineImage;

use crate::xml::XmlNode;

const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Build a `w:drawing` element holding `image` as an inline picture.
///
/// Namespace declarations are written on the elements that use them, so the
/// result is valid in any part regardless of what its root declares. `id`
/// must be unique among the package's drawing objects.
pub fn inline_drawing(image: &InlineImage, id: u32) -> XmlNode {
    let cx = image.width_emu.to_string();
    let cy = image.height_emu.to_string();
    let label = format!("Picture {id}");

    let pic = XmlNode::new("pic:pic")
        .with_attr("xmlns:pic", PIC_NS)
        .with_child(
            XmlNode::new("pic:nvPicPr")
                .with_child(
                    XmlNode::new("pic:cNvPr")
                        .with_attr("id", "0")
                        .with_attr("name", image.name.as_str()),
                )
                .with_child(XmlNode::new("pic:cNvPicPr")),
        )
        .with_child(
            XmlNode::new("pic:blipFill")
                .with_child(
                    XmlNode::new("a:blip")
                        .with_attr("xmlns:r", R_NS)
                        .with_attr("r:embed", image.relationship_id.as_str()),
                )
                .with_child(XmlNode::new("a:stretch").with_child(XmlNode::new("a:fillRect"))),
        )
        .with_child(
            XmlNode::new("pic:spPr")
                .with_child(
                    XmlNode::new("a:xfrm")
                        .with_child(XmlNode::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                        .with_child(
                            XmlNode::new("a:ext")
                                .with_attr("cx", cx.as_str())
                                .with_attr("cy", cy.as_str()),
                        ),
                )
                .with_child(
                    XmlNode::new("a:prstGeom")
                        .with_attr("prst", "rect")
                        .with_child(XmlNode::new("a:avLst")),
                ),
        );

    let inline = XmlNode::new("wp:inline")
        .with_attr("xmlns:wp", WP_NS)
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(
            XmlNode::new("wp:extent")
                .with_attr("cx", cx.as_str())
                .with_attr("cy", cy.as_str()),
        )
        .with_child(
            XmlNode::new("wp:docPr")
                .with_attr("id", id.to_string())
                .with_attr("name", label)
                .with_attr("descr", image.name.as_str()),
        )
        .with_child(
            XmlNode::new("wp:cNvGraphicFramePr").with_child(
                XmlNode::new("a:graphicFrameLocks")
                    .with_attr("xmlns:a", A_NS)
                    .with_attr("noChangeAspect", "1"),
            ),
        )
        .with_child(
            XmlNode::new("a:graphic").with_attr("xmlns:a", A_NS).with_child(
                XmlNode::new("a:graphicData")
                    .with_attr("uri", PIC_NS)
                    .with_child(pic),
            ),
        );

    XmlNode::new("w:drawing").with_child(inline)
}
