//! Declarations of the register IP instantiated by the multiplexed backend.

use regforge_config::RegctrlConfig;
use regforge_ir::{
    ComponentDecl, ComponentParam, ComponentPort, ParamKind, PortDirection, PortWidth,
};
use regforge_tree::RegTemplate;

fn bit(name: &str, direction: PortDirection) -> ComponentPort {
    ComponentPort {
        name: name.to_string(),
        direction,
        width: PortWidth::Bit,
    }
}

fn vector(name: &str, direction: PortDirection, scale: u32) -> ComponentPort {
    ComponentPort {
        name: name.to_string(),
        direction,
        width: PortWidth::Param {
            param: "N".to_string(),
            scale,
        },
    }
}

/// Declaration of the component implementing `template`, with its
/// configuration binding.
pub fn declaration(template: RegTemplate, config: &RegctrlConfig) -> ComponentDecl {
    use PortDirection::{Input, Output};
    match template {
        RegTemplate::CtrlRegN => ComponentDecl {
            name: template.name().to_string(),
            params: vec![ComponentParam {
                name: "N".to_string(),
                kind: ParamKind::Integer,
                default: 16,
            }],
            ports: vec![
                bit("Clk", Input),
                bit("Rst", Input),
                bit("CRegSel", Input),
                bit("WriteMem", Input),
                vector("VMEWrData", Input, 1),
                vector("AutoClrMsk", Input, 1),
                vector("CReg", Output, 1),
                vector("Preset", Input, 1),
            ],
            binding: Some(config.ctrlregn_binding.clone()),
        },
        RegTemplate::RmwReg => ComponentDecl {
            name: template.name().to_string(),
            params: vec![ComponentParam {
                name: "N".to_string(),
                kind: ParamKind::Natural,
                default: 8,
            }],
            ports: vec![
                vector("VMEWrData", Input, 2),
                bit("Clk", Input),
                vector("AutoClrMsk", Input, 1),
                bit("Rst", Input),
                bit("CRegSel", Input),
                vector("CReg", Output, 1),
                bit("WriteMem", Input),
                vector("Preset", Input, 1),
            ],
            binding: Some(config.rmwreg_binding.clone()),
        },
    }
}
