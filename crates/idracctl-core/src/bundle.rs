//! Server configuration profile bundles
//!
//! iDRAC has no standard Redfish way to set a virtual media boot override.
//! Instead a small Server Configuration Profile is imported through the OEM
//! `ImportSystemConfiguration` action and applied as a background job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{CoreError, Result};

/// Virtual media types a caller may ask to boot from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum VirtualMediaType {
    #[serde(rename = "CD")]
    #[value(name = "CD", alias = "cd")]
    Cd,
    #[serde(rename = "DVD")]
    #[value(name = "DVD", alias = "dvd")]
    Dvd,
    #[serde(rename = "Floppy")]
    #[value(name = "Floppy", alias = "floppy")]
    Floppy,
    #[serde(rename = "USBStick")]
    #[value(name = "USBStick", alias = "usb")]
    UsbStick,
}

impl fmt::Display for VirtualMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VirtualMediaType::Cd => write!(f, "CD"),
            VirtualMediaType::Dvd => write!(f, "DVD"),
            VirtualMediaType::Floppy => write!(f, "Floppy"),
            VirtualMediaType::UsbStick => write!(f, "USBStick"),
        }
    }
}

impl FromStr for VirtualMediaType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cd" => Ok(VirtualMediaType::Cd),
            "dvd" => Ok(VirtualMediaType::Dvd),
            "floppy" => Ok(VirtualMediaType::Floppy),
            "usbstick" | "usb" => Ok(VirtualMediaType::UsbStick),
            _ => Err(CoreError::InvalidParameter(format!(
                "Unknown or unsupported device {}",
                s
            ))),
        }
    }
}

/// Media kinds that have a configuration bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Cd,
    Floppy,
}

impl MediaKind {
    /// `ServerBoot.1#FirstBootDevice` value for this kind
    pub fn boot_literal(self) -> &'static str {
        match self {
            MediaKind::Cd => "VCD-DVD",
            MediaKind::Floppy => "VFDD",
        }
    }
}

impl TryFrom<VirtualMediaType> for MediaKind {
    type Error = CoreError;

    fn try_from(media: VirtualMediaType) -> Result<Self> {
        match media {
            VirtualMediaType::Cd => Ok(MediaKind::Cd),
            VirtualMediaType::Floppy => Ok(MediaKind::Floppy),
            other => Err(CoreError::InvalidParameter(format!(
                "Unknown or unsupported device {}",
                other
            ))),
        }
    }
}

/// `ServerBoot.1#BootOnce` attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOnce {
    Enabled,
    Disabled,
}

impl BootOnce {
    /// Persistent overrides turn boot-once off; everything else is next boot only
    pub fn for_persistence(persistent: bool) -> Self {
        if persistent {
            BootOnce::Disabled
        } else {
            BootOnce::Enabled
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BootOnce::Enabled => "Enabled",
            BootOnce::Disabled => "Disabled",
        }
    }
}

/// A configuration bundle ready to import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBundle {
    pub component_id: String,
    pub boot_once: BootOnce,
    pub media: MediaKind,
}

impl ConfigBundle {
    /// Bundle selecting `media` as first boot device on `component_id`
    pub fn boot_device(component_id: impl Into<String>, media: MediaKind, persistent: bool) -> Self {
        Self {
            component_id: component_id.into(),
            boot_once: BootOnce::for_persistence(persistent),
            media,
        }
    }

    /// Serialize to the Server Configuration Profile XML.
    ///
    /// The output has no whitespace between elements or inside attribute
    /// values: the controller fails the import job otherwise.
    pub fn to_xml(&self) -> String {
        format!(
            concat!(
                "<SystemConfiguration>",
                "<Component FQDD=\"{fqdd}\">",
                "<Attribute Name=\"ServerBoot.1#BootOnce\">{boot_once}</Attribute>",
                "<Attribute Name=\"ServerBoot.1#FirstBootDevice\">{device}</Attribute>",
                "</Component>",
                "</SystemConfiguration>"
            ),
            fqdd = escape_attr(&self.component_id),
            boot_once = self.boot_once.as_str(),
            device = self.media.boot_literal(),
        )
    }

    /// Request body for the `ImportSystemConfiguration` action
    pub fn action_payload(&self) -> Value {
        json!({
            "ShareParameters": {"Target": "ALL"},
            "ImportBuffer": self.to_xml(),
        })
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cd_bundle_xml() {
        let bundle = ConfigBundle::boot_device("iDRAC.Embedded.1", MediaKind::Cd, false);
        assert_eq!(
            bundle.to_xml(),
            "<SystemConfiguration><Component FQDD=\"iDRAC.Embedded.1\">\
             <Attribute Name=\"ServerBoot.1#BootOnce\">Enabled</Attribute>\
             <Attribute Name=\"ServerBoot.1#FirstBootDevice\">VCD-DVD</Attribute>\
             </Component></SystemConfiguration>"
        );
    }

    #[test]
    fn test_floppy_persistent_bundle_xml() {
        let xml = ConfigBundle::boot_device("iDRAC.Embedded.1", MediaKind::Floppy, true).to_xml();
        assert!(xml.contains("<Attribute Name=\"ServerBoot.1#BootOnce\">Disabled</Attribute>"));
        assert!(xml.contains(">VFDD</Attribute>"));
    }

    #[test]
    fn test_persistence_attribute_for_every_kind() {
        for media in [MediaKind::Cd, MediaKind::Floppy] {
            for persistent in [true, false] {
                let bundle = ConfigBundle::boot_device("c", media, persistent);
                let expected = if persistent { "Disabled" } else { "Enabled" };
                assert_eq!(bundle.boot_once.as_str(), expected);
                assert!(bundle.to_xml().contains(&format!(">{}<", expected)));
                assert!(
                    bundle
                        .to_xml()
                        .contains(&format!(">{}<", media.boot_literal()))
                );
            }
        }
    }

    #[test]
    fn test_xml_has_no_insignificant_whitespace() {
        let xml = ConfigBundle::boot_device("iDRAC.Embedded.1", MediaKind::Cd, true).to_xml();
        assert!(!xml.contains('\n'));
        assert!(!xml.contains("> <"));
        assert!(!xml.contains(">\t"));
    }

    #[test]
    fn test_component_id_is_escaped() {
        let xml = ConfigBundle::boot_device("a\"b<c", MediaKind::Cd, false).to_xml();
        assert!(xml.contains("FQDD=\"a&quot;b&lt;c\""));
    }

    #[test]
    fn test_action_payload_shape() {
        let payload = ConfigBundle::boot_device("iDRAC.Embedded.1", MediaKind::Cd, false)
            .action_payload();
        assert_eq!(payload["ShareParameters"]["Target"], "ALL");
        assert!(
            payload["ImportBuffer"]
                .as_str()
                .unwrap()
                .starts_with("<SystemConfiguration>")
        );
    }

    #[test]
    fn test_media_kind_mapping_is_partial() {
        assert_eq!(MediaKind::try_from(VirtualMediaType::Cd).unwrap(), MediaKind::Cd);
        assert_eq!(
            MediaKind::try_from(VirtualMediaType::Floppy).unwrap(),
            MediaKind::Floppy
        );
        assert!(
            MediaKind::try_from(VirtualMediaType::Dvd)
                .unwrap_err()
                .is_invalid_parameter()
        );
        assert!(
            MediaKind::try_from(VirtualMediaType::UsbStick)
                .unwrap_err()
                .is_invalid_parameter()
        );
    }

    #[test]
    fn test_virtual_media_type_parse() {
        assert_eq!("CD".parse::<VirtualMediaType>().unwrap(), VirtualMediaType::Cd);
        assert_eq!(
            "usbstick".parse::<VirtualMediaType>().unwrap(),
            VirtualMediaType::UsbStick
        );
        let err = "tape".parse::<VirtualMediaType>().unwrap_err();
        assert!(err.is_invalid_parameter());
        assert!(err.to_string().contains("tape"));
    }
}
