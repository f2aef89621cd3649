
use anyhow::Result;
use harness::Console;
use mcp_tool_console::{
    app::backend::ConsoleBackend,
    domain::detail::{DetailTab, Merge},
    shared::{
        error::ConsoleError,
        types::{EnableToolFavoriteParams, GetToolDetailParams, ListToolSquareParams},
    },
};
use serde_json::json;

#[tokio::test]
async fn list_filters_and_pages() -> Result<()> {
    let console = Console::start().await?;

    let page = console
        .api
        .list_tool_square(&ListToolSquareParams {
            page_size: 2,
            ..ListToolSquareParams::default()
        })
        .await?;
    assert_eq!(page.total_count, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.page_data.len(), 2);

    let page = console
        .api
        .list_tool_square(&ListToolSquareParams {
            content: Some("calc".into()),
            ..ListToolSquareParams::default()
        })
        .await?;
    assert_eq!(page.page_data.len(), 1);
    assert!(page.page_data[0].is_mcp);
    assert_eq!(page.page_data[0].mcp_tool_id.as_deref(), Some("calc"));

    console.mock.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn favorite_round_trip() -> Result<()> {
    let console = Console::start().await?;
    let add = EnableToolFavoriteParams {
        tool_id: "t-weather".into(),
        favorite_flag: 0,
        is_mcp: false,
    };
    assert_eq!(console.api.enable_tool_favorite(&add).await?, 1);
    assert!(console.mock.state.is_favorite("t-weather"));

    let remove = EnableToolFavoriteParams {
        favorite_flag: 1,
        ..add
    };
    console.api.enable_tool_favorite(&remove).await?;
    assert!(!console.mock.state.is_favorite("t-weather"));

    let unknown = EnableToolFavoriteParams {
        tool_id: "t-nope".into(),
        favorite_flag: 0,
        is_mcp: false,
    };
    let err = console.api.enable_tool_favorite(&unknown).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Application { code: 3, .. }));
    assert_eq!(console.notifier.count(), 0);

    console.mock.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn tool_detail_reports_errors_exactly_once() -> Result<()> {
    let console = Console::start().await?;

    let detail = console
        .api
        .get_tool_detail(&GetToolDetailParams {
            id: "t-calc".into(),
            tag: Some("math".into()),
        })
        .await?;
    assert_eq!(detail.name, "Calculator");
    assert_eq!(detail.usage_count, 42);
    assert_eq!(detail.extra.get("tag"), Some(&json!("math")));
    assert_eq!(console.notifier.count(), 0);

    let err = console
        .api
        .get_tool_detail(&GetToolDetailParams {
            id: "missing".into(),
            tag: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "tool not found");
    assert_eq!(console.notifier.messages(), ["tool not found"]);

    console.mock.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn server_detail_builds_argument_forms() -> Result<()> {
    let console = Console::start().await?;
    let controller = console.controller();

    assert_eq!(controller.load("calc").await?, Merge::Applied);
    controller.with_view(|view| {
        let record = view.record().expect("record loaded");
        assert_eq!(record.name, "Calculator");
        assert_eq!(record.tools.len(), 3);
        let echo = &record.tools[0];
        let names: Vec<&str> = echo.args.iter().map(|arg| arg.name.as_str()).collect();
        assert_eq!(names, ["text", "repeat"]);
        assert!(echo.args[0].required);
        assert_eq!(echo.args[0].value, json!(""));
        assert_eq!(echo.args[1].value, json!(1));
        assert_eq!(record.tools[1].args[0].value, json!("[]"));
        assert!(record.tools[2].args.is_empty());
    });
    assert!(!controller.can_run(0));
    assert!(controller.can_run(2));
    assert!(!controller.select_tab(DetailTab::Overview));

    let err = controller.load("nowhere").await.unwrap_err();
    assert_eq!(err.to_string(), "server not found");
    assert_eq!(console.notifier.count(), 1);

    console.mock.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn debug_sends_structured_array() -> Result<()> {
    let console = Console::start().await?;
    let controller = console.controller();
    controller.load("calc").await?;

    assert!(controller.set_arg_text(1, 0, "[1,2]")?);
    assert_eq!(controller.run_debug(1).await?, Merge::Applied);

    controller.with_view(|view| {
        let tool = view.tool(1).expect("add tool");
        assert_eq!(tool.text_result.as_deref(), Some("3"));
        assert!(!tool.loading);
    });

    let calls = console.mock.state.debug_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        json!({
            "mcpServerId": "calc",
            "mcpServerUrl": "http://calc.internal/sse",
            "toolName": "add",
            "toolId": "calc",
            "toolArgs": {"numbers": [1, 2]}
        })
    );

    console.mock.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn echo_uses_defaults_and_edits() -> Result<()> {
    let console = Console::start().await?;
    let controller = console.controller();
    controller.load("calc").await?;

    controller.set_arg_text(0, 0, "hi")?;
    controller.set_arg_text(0, 1, "2")?;
    controller.run_debug(0).await?;
    let text = controller.with_view(|view| view.tool(0).and_then(|t| t.text_result.clone()));
    assert_eq!(text.as_deref(), Some("hi hi"));

    let bad = controller.set_arg_text(0, 1, "two");
    assert!(matches!(bad, Err(ConsoleError::InvalidArgument { .. })));
    assert_eq!(console.notifier.count(), 1);

    console.mock.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn failing_tool_is_notified_once() -> Result<()> {
    let console = Console::start().await?;
    let controller = console.controller();
    controller.load("calc").await?;

    let err = controller.run_debug(2).await.unwrap_err();
    assert_eq!(err.to_string(), "tool exploded");
    assert_eq!(console.notifier.messages(), ["tool exploded"]);
    controller.with_view(|view| {
        let tool = view.tool(2).expect("fail tool");
        assert!(!tool.loading);
        assert!(tool.text_result.is_none());
    });

    console.mock.shutdown().await;
    Ok(())
}
