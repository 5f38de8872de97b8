//! XML projection of asset records.
//!
//! Each asset kind maps to one fixed fragment shape. The fragments are an
//! exact output contract consumed by a legacy client: attribute order, literal
//! attributes and the absence of escaping are all deliberate. Field values
//! interpolate in their JSON text form; missing or null fields interpolate as
//! the empty string.

use crate::blobs::BlobStore;
use crate::record::{AssetKind, AssetRecord};
use serde_json::Value;

/// Project a record into its XML fragment.
///
/// Dispatches on the parsed [`AssetKind`]; a record whose `type` field is
/// missing or unrecognized yields `None`, which callers must treat as a
/// silent no-render rather than an error.
pub fn project(record: &AssetRecord) -> Option<String> {
    let kind = record.kind()?;
    let id = text(record, "id");

    let xml = match kind {
        AssetKind::Char => char_xml(&id, record),
        AssetKind::Bg => bg_xml(&id, record),
        AssetKind::Movie => movie_xml(&id, record),
        AssetKind::Prop => prop_xml(&id, record),
        AssetKind::Sound => sound_xml(&id, record),
    };
    Some(xml)
}

fn char_xml(id: &str, record: &AssetRecord) -> String {
    let theme_id = text(record, "themeId");
    format!(
        r#"<char id="{id}" enc_asset_id="{id}" name="Untitled" cc_theme_id="{theme_id}" thumbnail_url="char_default.png" copyable="Y"><tags/></char>"#
    )
}

fn bg_xml(id: &str, record: &AssetRecord) -> String {
    let title = text(record, "title");
    format!(
        r#"<background subtype="0" id="{id}" enc_asset_id="{id}" name="{title}" enable="Y" asset_url="/assets/{id}"/>"#
    )
}

fn movie_xml(id: &str, record: &AssetRecord) -> String {
    let scene_count = text(record, "sceneCount");
    let title = text(record, "title");
    format!(
        r#"<movie id="{id}" enc_asset_id="{id}" path="/_SAVED/{id}" numScene="{scene_count}" title="{title}" thumbnail_url="/file/movie/thumb/{id}"><tags></tags></movie>"#
    )
}

// Props fork on subtype: video props carry dimensions and a derived
// thumbnail URL, everything else gets the flag attribute named by `ptype`.
fn prop_xml(id: &str, record: &AssetRecord) -> String {
    let title = text(record, "title");
    if record.subtype() == Some("video") {
        let width = text(record, "width");
        let height = text(record, "height");
        let thumb = BlobStore::thumb_key(id);
        format!(
            r#"<prop subtype="video" id="{id}" enc_asset_id="{id}" name="{title}" enable="Y" placeable="1" facing="left" width="{width}" height="{height}" asset_url="/assets/{id}" thumbnail_url="/assets/{thumb}"/>"#
        )
    } else {
        let ptype = text(record, "ptype");
        format!(
            r#"<prop subtype="0" id="{id}" enc_asset_id="{id}" name="{title}" enable="Y" {ptype}="1" facing="left" width="0" height="0" asset_url="/assets/{id}"/>"#
        )
    }
}

fn sound_xml(id: &str, record: &AssetRecord) -> String {
    let subtype = text(record, "subtype");
    let title = text(record, "title");
    let duration = text(record, "duration");
    format!(
        r#"<sound subtype="{subtype}" id="{id}" enc_asset_id="{id}" name="{title}" enable="Y" duration="{duration}" downloadtype="progressive"/>"#
    )
}

/// Template text for a field: strings verbatim, numbers and booleans in JSON
/// form, missing and null as the empty string.
fn text(record: &AssetRecord, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_shape() {
        let record = AssetRecord::new()
            .with("id", "a1b2c3.xml")
            .with("type", "char")
            .with("themeId", "family");

        assert_eq!(
            project(&record).unwrap(),
            r#"<char id="a1b2c3.xml" enc_asset_id="a1b2c3.xml" name="Untitled" cc_theme_id="family" thumbnail_url="char_default.png" copyable="Y"><tags/></char>"#
        );
    }

    #[test]
    fn test_bg_shape() {
        let record = AssetRecord::new()
            .with("id", "bg01.jpg")
            .with("type", "bg")
            .with("title", "Sunset");

        assert_eq!(
            project(&record).unwrap(),
            r#"<background subtype="0" id="bg01.jpg" enc_asset_id="bg01.jpg" name="Sunset" enable="Y" asset_url="/assets/bg01.jpg"/>"#
        );
    }

    #[test]
    fn test_movie_shape() {
        let record = AssetRecord::new()
            .with("id", "deadbeef.zip")
            .with("type", "movie")
            .with("sceneCount", 3)
            .with("title", "My Movie");

        assert_eq!(
            project(&record).unwrap(),
            r#"<movie id="deadbeef.zip" enc_asset_id="deadbeef.zip" path="/_SAVED/deadbeef.zip" numScene="3" title="My Movie" thumbnail_url="/file/movie/thumb/deadbeef.zip"><tags></tags></movie>"#
        );
    }

    #[test]
    fn test_prop_video_shape() {
        let record = AssetRecord::new()
            .with("id", "pv.mp4")
            .with("type", "prop")
            .with("subtype", "video")
            .with("title", "Clip")
            .with("width", 640)
            .with("height", 360);

        assert_eq!(
            project(&record).unwrap(),
            r#"<prop subtype="video" id="pv.mp4" enc_asset_id="pv.mp4" name="Clip" enable="Y" placeable="1" facing="left" width="640" height="360" asset_url="/assets/pv.mp4" thumbnail_url="/assets/pv.png"/>"#
        );
    }

    #[test]
    fn test_prop_other_shape() {
        let record = AssetRecord::new()
            .with("id", "rock.png")
            .with("type", "prop")
            .with("title", "Rock")
            .with("ptype", "placeable");

        assert_eq!(
            project(&record).unwrap(),
            r#"<prop subtype="0" id="rock.png" enc_asset_id="rock.png" name="Rock" enable="Y" placeable="1" facing="left" width="0" height="0" asset_url="/assets/rock.png"/>"#
        );
    }

    #[test]
    fn test_sound_shape() {
        let record = AssetRecord::new()
            .with("id", "s9.mp3")
            .with("type", "sound")
            .with("subtype", "soundeffect")
            .with("title", "Boom")
            .with("duration", 2500);

        assert_eq!(
            project(&record).unwrap(),
            r#"<sound subtype="soundeffect" id="s9.mp3" enc_asset_id="s9.mp3" name="Boom" enable="Y" duration="2500" downloadtype="progressive"/>"#
        );
    }

    #[test]
    fn test_unknown_type_is_silent() {
        let unknown = AssetRecord::new().with("id", "x.bin").with("type", "tts");
        assert_eq!(project(&unknown), None);

        let untyped = AssetRecord::new().with("id", "x.bin");
        assert_eq!(project(&untyped), None);
    }

    #[test]
    fn test_missing_field_renders_empty() {
        let record = AssetRecord::new().with("id", "a1.xml").with("type", "char");
        assert_eq!(
            project(&record).unwrap(),
            r#"<char id="a1.xml" enc_asset_id="a1.xml" name="Untitled" cc_theme_id="" thumbnail_url="char_default.png" copyable="Y"><tags/></char>"#
        );
    }

    #[test]
    fn test_prop_non_string_subtype_takes_plain_shape() {
        // A numeric subtype is not the string "video", so the plain prop
        // shape applies.
        let record = AssetRecord::new()
            .with("id", "p.png")
            .with("type", "prop")
            .with("subtype", 1)
            .with("title", "P")
            .with("ptype", "holdable");

        let xml = project(&record).unwrap();
        assert!(xml.starts_with(r#"<prop subtype="0""#));
        assert!(xml.contains(r#"holdable="1""#));
    }

    #[test]
    fn test_no_escaping_applied() {
        // The contract is verbatim interpolation, ampersands and all.
        let record = AssetRecord::new()
            .with("id", "bg02.jpg")
            .with("type", "bg")
            .with("title", "Salt & Pepper");

        assert_eq!(
            project(&record).unwrap(),
            r#"<background subtype="0" id="bg02.jpg" enc_asset_id="bg02.jpg" name="Salt & Pepper" enable="Y" asset_url="/assets/bg02.jpg"/>"#
        );
    }
}
