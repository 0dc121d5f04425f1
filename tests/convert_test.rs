//! Library-level conversion tests over complete device descriptions.

use echonet_dtdl::{
    convert, emit_schema, ConvertError, ConvertOptions, Diagnostics, InterfaceKind, Normalizer,
    ViolationCategory,
};
use serde_json::{json, Value};

fn document(definitions: Value, devices: Value) -> Value {
    json!({ "definitions": definitions, "devices": devices })
}

fn aircon(properties: Value) -> Value {
    json!({
        "0x0130": {
            "className": { "ja": "家庭用エアコン", "en": "Home air conditioner" },
            "elProperties": properties
        }
    })
}

fn definitions() -> Value {
    json!({
        "state_ON_OFF_3031": {
            "type": "state",
            "size": 1,
            "enum": [
                { "edt": "0x30", "state": { "ja": "ON", "en": "true" } },
                { "edt": "0x31", "state": { "ja": "OFF", "en": "false" } }
            ]
        },
        "number_0-100percent": {
            "type": "number",
            "format": "uint8",
            "minimum": 0,
            "maximum": 100,
            "unit": "%"
        },
        "raw_1": { "type": "raw", "minSize": 1, "maxSize": 1 }
    })
}

fn contents(conversion: &echonet_dtdl::Conversion) -> Value {
    conversion.to_value().unwrap()[0]["contents"].clone()
}

mod properties {
    use super::*;

    #[test]
    fn all_optional_level_is_writable_integer_property() {
        let doc = document(
            json!({}),
            aircon(json!({
                "0xA0": {
                    "propertyName": { "ja": "風量設定", "en": "Air flow rate setting" },
                    "accessRule": { "get": "optional", "set": "optional", "inf": "optional" },
                    "data": { "type": "level" }
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        assert!(conversion.is_clean());
        assert_eq!(
            contents(&conversion),
            json!([{
                "@id": "urn:EchonetLite:Air_flow_rate_setting:1",
                "@type": "Property",
                "@context": "http://azureiot.com/v1/contexts/IoTModel.json",
                "name": "Air_flow_rate_setting",
                "schema": "integer",
                "displayName": { "en": "Air flow rate setting", "ja": "風量設定" },
                "writable": true
            }])
        );
    }

    #[test]
    fn state_command_without_inf_expands_per_state() {
        let doc = document(
            json!({}),
            aircon(json!({
                "0xB0": {
                    "propertyName": { "en": "Power" },
                    "accessRule": { "get": "notApplicable", "set": "optional" },
                    "data": { "type": "state", "enum": [{ "edt": "0x41", "state": { "en": "on" } }] }
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        assert!(conversion.is_clean());
        assert_eq!(
            contents(&conversion),
            json!([{
                "@type": "Command",
                "@context": "http://azureiot.com/v1/contexts/IoTModel.json",
                "name": "on",
                "displayName": "on",
                "commandType": "synchronous"
            }])
        );
    }

    #[test]
    fn state_command_yields_one_command_per_entry() {
        let doc = document(
            definitions(),
            aircon(json!({
                "0xB1": {
                    "propertyName": { "en": "Reset" },
                    "accessRule": { "get": "notApplicable", "set": "required", "inf": "optional" },
                    "data": { "$ref": "#/definitions/state_ON_OFF_3031" }
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        let device = &conversion.interfaces[0];
        assert_eq!(device.contents.len(), 2);
        for content in &device.contents {
            assert_eq!(content.kind, InterfaceKind::Command);
            assert!(content.schema.is_none());
            assert!(content.id.is_none());
        }
    }

    #[test]
    fn referenced_number_keeps_unit_and_read_only_flag() {
        let doc = document(
            definitions(),
            aircon(json!({
                "0xB4": {
                    "propertyName": { "en": "Humidity setting" },
                    "accessRule": { "get": "required", "set": "notApplicable", "inf": "optional" },
                    "data": { "$ref": "#/definitions/number_0-100percent" }
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        let rendered = contents(&conversion);
        assert_eq!(rendered[0]["@type"], "Property");
        assert_eq!(rendered[0]["schema"], "integer");
        assert_eq!(rendered[0]["displayUnit"], "%");
        assert_eq!(rendered[0]["writable"], false);
    }

    #[test]
    fn state_with_optional_inf_becomes_telemetry() {
        let doc = document(
            definitions(),
            aircon(json!({
                "0x80": {
                    "propertyName": { "ja": "動作状態", "en": "Operation status" },
                    "accessRule": { "get": "required", "set": "notApplicable", "inf": "optional" },
                    "data": { "$ref": "#/definitions/state_ON_OFF_3031" }
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        let rendered = contents(&conversion);
        assert_eq!(rendered[0]["@type"], "Telemetry");
        assert_eq!(
            rendered[0]["schema"],
            json!({
                "@type": "Enum",
                "valueSchema": "integer",
                "enumValues": [
                    { "name": "true", "enumValue": 48, "displayName": { "en": "true", "ja": "ON" } },
                    { "name": "false", "enumValue": 49, "displayName": { "en": "false", "ja": "OFF" } }
                ]
            })
        );
    }

    #[test]
    fn data_one_of_splits_into_indexed_interfaces() {
        let doc = document(
            definitions(),
            aircon(json!({
                "0xB3": {
                    "propertyName": { "en": "Temperature setting" },
                    "accessRule": { "get": "required", "set": "required", "inf": "optional" },
                    "data": {
                        "oneOf": [
                            { "type": "number", "format": "uint8", "unit": "Celsius" },
                            { "type": "state", "enum": [{ "edt": "0xFD", "state": { "en": "undefined" } }] },
                            { "$ref": "#/definitions/raw_1" }
                        ]
                    }
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        assert!(conversion.is_clean());
        let ids: Vec<_> = conversion.interfaces[0]
            .contents
            .iter()
            .map(|c| c.id.clone().unwrap())
            .collect();
        assert_eq!(
            ids,
            vec![
                "urn:EchonetLite:Temperature_setting2:1",
                "urn:EchonetLite:Temperature_setting3:1",
                "urn:EchonetLite:Temperature_setting4:1"
            ]
        );
        let rendered = contents(&conversion);
        assert_eq!(rendered[0]["displayUnit"], "Celsius");
        assert_eq!(rendered[1]["schema"]["@type"], "Enum");
        assert_eq!(rendered[2]["schema"], "string");
    }

    #[test]
    fn data_one_of_expands_state_commands_beside_indexed_command() {
        let doc = document(
            json!({}),
            aircon(json!({
                "0xB5": {
                    "propertyName": { "ja": "運転モード", "en": "Operation mode" },
                    "accessRule": { "get": "notApplicable", "set": "optional" },
                    "data": {
                        "oneOf": [
                            {
                                "type": "state",
                                "enum": [
                                    { "edt": "0x41", "state": { "ja": "自動", "en": "Automatic" } },
                                    { "edt": "0x42", "state": { "ja": "冷房", "en": "Cooling" } }
                                ]
                            },
                            { "type": "level" }
                        ]
                    }
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        assert!(conversion.is_clean());
        let device = &conversion.interfaces[0];
        assert_eq!(device.contents.len(), 3);

        let names: Vec<_> = device.contents.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Automatic", "Cooling", "Operation_mode"]);
        for content in &device.contents[..2] {
            assert_eq!(content.kind, InterfaceKind::Command);
            assert!(content.id.is_none());
            assert!(content.schema.is_none());
            assert!(content.request.is_none());
        }

        let rendered = contents(&conversion);
        assert_eq!(rendered[2]["@id"], "urn:EchonetLite:Operation_mode3:1");
        assert_eq!(rendered[2]["@type"], "Command");
        assert_eq!(rendered[2]["commandType"], "synchronous");
        assert_eq!(rendered[2]["request"]["schema"], "integer");
        assert_eq!(rendered[2]["request"], rendered[2]["response"]);
    }

    #[test]
    fn property_level_one_of_reads_each_variant() {
        let doc = document(
            json!({}),
            aircon(json!({
                "0xE0": {
                    "oneOf": [
                        {
                            "validRelease": { "from": "A", "to": "G" },
                            "propertyName": { "en": "Measured value" },
                            "accessRule": { "get": "required", "set": "notApplicable", "inf": "required" },
                            "data": { "type": "number", "format": "int16" }
                        },
                        {
                            "validRelease": { "from": "H", "to": "latest" },
                            "propertyName": { "en": "Measured value" },
                            "accessRule": { "get": "required", "set": "notApplicable", "inf": "required" },
                            "data": { "type": "number", "format": "uint32" }
                        }
                    ]
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        assert!(conversion.is_clean());
        let rendered = contents(&conversion);
        assert_eq!(rendered.as_array().unwrap().len(), 2);
        assert_eq!(rendered[0]["schema"], "integer");
        assert_eq!(rendered[1]["schema"], "long");
    }

    #[test]
    fn property_without_english_name_is_silently_dropped() {
        let doc = document(
            json!({}),
            aircon(json!({
                "0xF0": {
                    "propertyName": { "ja": "メーカ独自" },
                    "accessRule": { "get": "optional", "set": "optional", "inf": "optional" },
                    "data": { "type": "raw" }
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        assert!(conversion.is_clean());
        assert_eq!(contents(&conversion), json!([]));
    }
}

mod devices {
    use super::*;

    #[test]
    fn device_without_english_class_name_contributes_nothing() {
        let doc = document(
            json!({}),
            json!({
                "0x0130": {
                    "className": { "ja": "家庭用エアコン" },
                    "elProperties": {
                        "0x80": {
                            "propertyName": { "en": "Operation status" },
                            "accessRule": { "get": "required", "set": "required", "inf": "required" },
                            "data": { "type": "level" }
                        },
                        "0x81": {
                            "propertyName": { "en": "Installation location" },
                            "accessRule": { "get": "required", "set": "required", "inf": "required" },
                            "data": { "type": "raw" }
                        }
                    }
                }
            }),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        assert_eq!(conversion.to_value().unwrap(), json!([]));
        assert_eq!(conversion.stats.devices_dropped, 1);
        assert_eq!(conversion.stats.interfaces, 0);
    }

    #[test]
    fn devices_are_emitted_in_document_order() {
        let doc = document(
            json!({}),
            json!({
                "0x0288": { "className": { "en": "Low voltage smart electric energy meter" } },
                "0x0130": { "className": { "ja": "家庭用エアコン", "en": "Home air conditioner" } },
                "0x05FF": { "className": { "en": "Controller" } }
            }),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        let ids: Vec<_> = conversion.interfaces.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "urn:EchonetLite:Low_voltage_smart_electric_energy_meter:1",
                "urn:EchonetLite:Home_air_conditioner:1",
                "urn:EchonetLite:Controller:1"
            ]
        );
        assert_eq!(conversion.to_value().unwrap()[2]["displayName"], "Controller");
    }

    #[test]
    fn device_variants_become_separate_interfaces() {
        let doc = document(
            json!({}),
            json!({
                "0x0279": {
                    "oneOf": [
                        {
                            "validRelease": { "from": "A", "to": "G" },
                            "className": { "ja": "住宅用太陽光発電", "en": "Release A" },
                            "elProperties": {
                                "0xE0": {
                                    "propertyName": { "en": "Measured instantaneous power" },
                                    "accessRule": { "get": "required", "set": "notApplicable", "inf": "optional" },
                                    "data": { "type": "number", "format": "uint16", "unit": "W" }
                                }
                            }
                        },
                        {
                            "validRelease": { "from": "J", "to": "latest" },
                            "className": { "ja": "住宅用太陽光発電", "en": "Release J" },
                            "elProperties": {
                                "0xE1": {
                                    "propertyName": { "en": "Cumulative power" },
                                    "accessRule": { "get": "required", "set": "notApplicable", "inf": "optional" },
                                    "data": { "type": "number", "format": "uint32", "unit": "kWh" }
                                }
                            }
                        }
                    ]
                }
            }),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        assert!(conversion.is_clean());
        let rendered = conversion.to_value().unwrap();
        assert_eq!(rendered.as_array().unwrap().len(), 2);
        assert_eq!(rendered[0]["@id"], "urn:EchonetLite:Release_A:1");
        assert_eq!(rendered[1]["@id"], "urn:EchonetLite:Release_J:1");
        assert_eq!(rendered[0]["contents"].as_array().unwrap().len(), 1);
        assert_eq!(rendered[1]["contents"].as_array().unwrap().len(), 1);
        assert_eq!(rendered[0]["contents"][0]["name"], "Measured_instantaneous_power");
        assert_eq!(rendered[1]["contents"][0]["name"], "Cumulative_power");
        assert_eq!(conversion.stats.devices, 1);
        assert_eq!(conversion.stats.devices_emitted, 2);
        assert_eq!(conversion.stats.interfaces, 2);
    }
}

mod diagnostics {
    use super::*;

    #[test]
    fn missing_definitions_is_fatal() {
        let err = convert(&json!({ "devices": {} }), &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::MissingMember { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn violations_skip_only_their_property() {
        let doc = document(
            definitions(),
            aircon(json!({
                "0x80": {
                    "propertyName": { "en": "Operation status" },
                    "accessRule": { "get": "required", "set": "required", "inf": "required" },
                    "data": { "$ref": "#/definitions/state_ON_OFF_3031" }
                },
                "0x81": {
                    "propertyName": { "en": "Bad access" },
                    "accessRule": { "get": "notApplicable", "set": "notApplicable", "inf": "required" },
                    "data": { "type": "level" }
                },
                "0x82": {
                    "propertyName": { "en": "Missing data" },
                    "accessRule": { "get": "required", "set": "required", "inf": "required" }
                },
                "0x83": {
                    "propertyName": { "en": "Dangling" },
                    "accessRule": { "get": "required", "set": "required", "inf": "required" },
                    "data": { "$ref": "#/definitions/nope" }
                },
                "0x84": {
                    "propertyName": { "en": "Fault status" },
                    "accessRule": { "get": "required", "set": "notApplicable", "inf": "required" },
                    "data": { "type": "level", "vendorHint": true }
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();

        let names: Vec<_> = conversion.interfaces[0]
            .contents
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Operation_status", "Fault_status"]);

        let found: Vec<_> = conversion
            .diagnostics
            .iter()
            .map(|d| (d.code, d.path.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("S014", "/devices/0x0130/elProperties/0x81"),
                ("U001", "/devices/0x0130/elProperties/0x82"),
                ("S011", "/devices/0x0130/elProperties/0x83/data/$ref"),
                ("U001", "/devices/0x0130/elProperties/0x83"),
                ("S001", "/devices/0x0130/elProperties/0x84/data/vendorHint"),
            ]
        );
        assert_eq!(
            conversion.diagnostics[1].category,
            ViolationCategory::UnsupportedShape
        );
    }

    #[test]
    fn reference_cycles_are_reported_not_followed() {
        let doc = document(
            json!({
                "a": { "$ref": "#/definitions/b" },
                "b": { "$ref": "#/definitions/a" }
            }),
            aircon(json!({
                "0x80": {
                    "propertyName": { "en": "Loop" },
                    "accessRule": { "get": "required", "set": "required", "inf": "required" },
                    "data": { "$ref": "#/definitions/a" }
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        assert!(conversion.diagnostics.iter().any(|d| d.code == "S012"));
        assert!(conversion.interfaces[0].contents.is_empty());
    }
}

mod normalizer {
    use super::*;

    #[test]
    fn reference_inlining_is_transparent() {
        let definitions = json!({
            "bitmap_fault": {
                "type": "bitmap",
                "size": 1,
                "bitmaps": [
                    {
                        "name": "filter",
                        "descriptions": { "ja": "フィルタ", "en": "Filter" },
                        "position": { "index": 0, "bitMask": "0b00000001" },
                        "value": { "type": "level" }
                    }
                ]
            }
        });
        let table = definitions.as_object().unwrap();
        let by_reference = json!({ "$ref": "#/definitions/bitmap_fault" });

        let mut diags = Diagnostics::new();
        let mut normalizer = Normalizer::new(table, 32);
        let referenced = normalizer.normalize(&by_reference, "/a", &mut diags);
        let direct = normalizer.normalize(&definitions["bitmap_fault"], "/b", &mut diags);
        assert!(diags.is_empty());

        assert_eq!(referenced.kind, direct.kind);
        assert_eq!(referenced.meta, direct.meta);
        assert_eq!(
            referenced.reference.as_deref(),
            Some("#/definitions/bitmap_fault")
        );
        assert_eq!(
            serde_json::to_string(&emit_schema(&referenced).unwrap()).unwrap(),
            serde_json::to_string(&emit_schema(&direct).unwrap()).unwrap()
        );
    }
}

mod output {
    use super::*;

    #[test]
    fn pretty_output_preserves_member_order() {
        let doc = document(
            definitions(),
            aircon(json!({
                "0xB0": {
                    "propertyName": { "en": "Mode setting" },
                    "accessRule": { "get": "required", "set": "required", "inf": "required" },
                    "data": { "type": "level", "unit": "%" }
                }
            })),
        );
        let conversion = convert(&doc, &ConvertOptions::default()).unwrap();
        let text = conversion.to_json_pretty().unwrap();

        let order = [
            "\"@id\"",
            "\"@type\": \"Interface\"",
            "\"@context\"",
            "\"displayName\"",
            "\"contents\"",
            "\"@type\": \"Property\"",
            "\"name\": \"Mode_setting\"",
            "\"schema\"",
            "\"displayUnit\"",
            "\"writable\"",
        ];
        let mut at = 0;
        for needle in order {
            let found = text[at..].find(needle).unwrap_or_else(|| panic!("{needle} out of order"));
            at += found + needle.len();
        }
        assert!(text.contains("\n        \"@type\": \"Interface\""));
        assert!(text.contains("http://azureiot.com/v1/contexts/IoTModel.json"));
    }
}
