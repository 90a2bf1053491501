pub mod cih_text_parser;
pub mod cihx_xml_parser;
pub mod header_parser;
