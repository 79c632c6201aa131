use bdbridge::config::Config;

pub fn render_status(config: &Config, debug_mode: bool) -> String {
    let lines = vec![
        "◆ bdbridge status".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Config      {}", config.config_path.display()),
        format!("Settings    {}", config.settings_path.display()),
        String::new(),
        format!("  Output container   #{}", config.observer.output_container_id),
        format!("  Widget bar         #{}", config.widgets.bar_container_id),
        format!(
            "  Layout anchors     .{} → .{}",
            config.layout.primary_anchor_class, config.layout.fallback_anchor_class
        ),
        format!(
            "  Protocol           v{} (max {} bytes)",
            config.protocol.supported_version, config.protocol.max_message_bytes
        ),
        format!("  Dedup window       {} ms", config.protocol.dedup_window_ms),
        format!(
            "  Debug mode         {}",
            if debug_mode { "on" } else { "off" }
        ),
    ];
    lines.join("\n")
}
