//! `/device.xml`: a minimal UPnP MediaServer description document.

use crate::config::Config;

pub struct DeviceXml {
    pub friendly_name: String,
    pub base_url: String,
    pub device_id: String,
}

impl DeviceXml {
    pub fn from_config(config: &Config) -> Self {
        Self {
            friendly_name: config.friendly_name.clone(),
            base_url: config.effective_base_url(),
            device_id: config.device_id.clone(),
        }
    }

    pub fn as_xml(&self) -> String {
        format!(
            r#"<root xmlns="urn:schemas-upnp-org:device-1-0">
<specVersion>
<major>1</major>
<minor>0</minor>
</specVersion>
<URLBase>{base}</URLBase>
<device>
<deviceType>urn:schemas-upnp-org:device:MediaServer:1</deviceType>
<friendlyName>{name}</friendlyName>
<UDN>uuid:{id}</UDN>
</device>
</root>"#,
            base = self.base_url,
            name = self.friendly_name,
            id = self.device_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_friendly_name_and_udn() {
        let config = Config::compiled_defaults();
        let doc = DeviceXml::from_config(&config).as_xml();
        assert!(doc.contains("<friendlyName>Plex Tuner</friendlyName>"));
        assert!(doc.contains("<UDN>uuid:plextuner01</UDN>"));
        assert!(doc.contains("<URLBase>http://localhost:5004</URLBase>"));
    }
}
