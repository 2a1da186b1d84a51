//! HTML结构编解码模块
//!
//! 将解析后的HTML文档无损地压平为扁平的可本地化内容映射（键为位置
//! 路径DomPath），随后把翻译值写回完全相同的DOM位置。
//!
//! DomPath文法：`rootTag "/" index ("/" index)* ["#" attrName]`，其中
//! rootTag ∈ {head, body}，index是节点在其父节点*过滤后*子节点列表中
//! 的0基位置。路径仅对派生它的那份文档快照有效；提取与回写之间不支持
//! 结构性变更。

// 标准库导入
use std::io::Cursor;

// 第三方crate导入
use html5ever::interface::{Attribute, QualName};
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::format_tendril;
use html5ever::tendril::TendrilSink;
use html5ever::{namespace_url, ns, parse_document, LocalName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use regex::Regex;
use tracing::debug;

// 本地模块导入
use crate::chunker::LocalizablePayload;
use crate::error::Result;

/// 提取后的文档快照
///
/// 内部持有解析得到的DOM，从提取到回写期间不对结构做任何变更，
/// 保证位置路径在两个阶段之间保持有效。
pub struct ExtractedDocument {
    dom: RcDom,
}

/// 按标签识别的可本地化属性
fn localizable_attribute(tag: &str) -> Option<&'static str> {
    match tag {
        "meta" => Some("content"),
        "img" => Some("alt"),
        "input" => Some("placeholder"),
        "a" => Some("title"),
        _ => None,
    }
}

/// 整棵子树不参与本地化的标签（包括其属性和文本）
fn is_unlocalizable(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

impl ExtractedDocument {
    /// 解析HTML字符串为文档快照
    ///
    /// 畸形或空文档按解析器的宽容结果接受，不做额外处理
    pub fn parse(html: &str) -> Result<Self> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| crate::localizer_error!(parse, format!("HTML解析失败: {:?}", e)))?;

        Ok(Self { dom })
    }

    /// 提取文档中的全部可本地化内容
    ///
    /// 分别以head和body子树为根执行两次独立遍历，各自贡献以
    /// `head`或`body`开头的键。与文本节点的修剪规则一致，按标签识别
    /// 的属性仅在其值修剪后非空时参与提取（`alt=""`不产生条目）
    pub fn extract(&self) -> LocalizablePayload {
        let mut payload = LocalizablePayload::new();

        for root_tag in ["head", "body"] {
            if let Some(root) = self.subtree_root(root_tag) {
                let mut indices = Vec::new();
                extract_subtree(&root, root_tag, &mut indices, &mut payload);
            }
        }

        payload
    }

    /// 将翻译映射写回到原始DOM位置
    ///
    /// 每个键解析出根标签与索引序列，沿过滤后子节点逐层下降定位目标
    /// 节点，然后设置命名属性或文本内容。无法解析到节点的条目被静默
    /// 跳过（宽容行为，偏向部分成功）。
    ///
    /// 副作用：回写完成后无条件把文档根元素的`lang`属性设为目标语言。
    pub fn apply(&self, translations: &LocalizablePayload, target_locale: &str) {
        let mut applied = 0usize;
        for (path, value) in translations {
            let Some(text) = value.as_str() else {
                debug!("跳过非字符串翻译值: {}", path);
                continue;
            };

            match self.resolve(path) {
                Some((node, Some(attr_name))) => {
                    set_node_attr(&node, &attr_name, text);
                    applied += 1;
                }
                Some((node, None)) => {
                    if set_text_content(&node, text) {
                        applied += 1;
                    } else {
                        debug!("路径未指向文本节点，跳过: {}", path);
                    }
                }
                None => {
                    debug!("路径无法解析，跳过: {}", path);
                }
            }
        }

        debug!("回写了 {} 个翻译条目", applied);

        if let Some(html) = find_child_element(&self.dom.document, "html") {
            set_node_attr(&html, "lang", target_locale);
        }
    }

    /// 序列化为完整的HTML文档字符串
    pub fn serialize(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let cursor = Cursor::new(&mut buffer);

        serialize(
            cursor,
            &SerializableHandle::from(self.dom.document.clone()),
            SerializeOpts::default(),
        )
        .map_err(|e| crate::localizer_error!(parse, format!("HTML序列化失败: {:?}", e)))?;

        String::from_utf8(buffer)
            .map_err(|e| crate::localizer_error!(parse, format!("UTF-8转换失败: {}", e)))
    }

    /// 定位head或body子树的根节点
    fn subtree_root(&self, root_tag: &str) -> Option<Handle> {
        let html = find_child_element(&self.dom.document, "html")?;
        find_child_element(&html, root_tag)
    }

    /// 将一个DomPath解析为目标节点和可选属性名
    fn resolve(&self, path: &str) -> Option<(Handle, Option<String>)> {
        let (root_tag, indices, attr) = parse_dom_path(path)?;
        let mut node = self.subtree_root(&root_tag)?;

        for index in indices {
            let children = filtered_children(&node);
            node = children.get(index)?.clone();
        }

        Some((node, attr))
    }
}

/// 递归提取一棵子树的可本地化内容
///
/// `indices`是从子树根到当前父节点的索引路径，随递归下降压入/弹出
fn extract_subtree(
    parent: &Handle,
    root_tag: &str,
    indices: &mut Vec<usize>,
    payload: &mut LocalizablePayload,
) {
    for (index, child) in filtered_children(parent).iter().enumerate() {
        match &child.data {
            NodeData::Text { contents } => {
                // 过滤后的文本节点必然非空
                let text = contents.borrow().trim().to_string();
                indices.push(index);
                payload.insert(
                    encode_dom_path(root_tag, indices, None),
                    serde_json::Value::String(text),
                );
                indices.pop();
            }
            NodeData::Element { name, attrs, .. } => {
                let tag = name.local.as_ref();
                if is_unlocalizable(tag) {
                    // script/style整棵子树（含属性）不参与
                    continue;
                }

                indices.push(index);

                if let Some(attr_name) = localizable_attribute(tag) {
                    let attr_value = attrs
                        .borrow()
                        .iter()
                        .find(|attr| attr.name.local.as_ref() == attr_name)
                        .map(|attr| attr.value.to_string());
                    if let Some(value) = attr_value {
                        if !value.trim().is_empty() {
                            payload.insert(
                                encode_dom_path(root_tag, indices, Some(attr_name)),
                                serde_json::Value::String(value),
                            );
                        }
                    }
                }

                extract_subtree(child, root_tag, indices, payload);
                indices.pop();
            }
            _ => {}
        }
    }
}

/// 枚举一个节点过滤后的子节点列表
///
/// 只保留元素节点和修剪后非空的文本节点；注释和纯空白文本不参与
/// 索引，保证索引在提取与回写两个阶段稳定且有意义
pub fn filtered_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| match &child.data {
            NodeData::Element { .. } => true,
            NodeData::Text { contents } => !contents.borrow().trim().is_empty(),
            _ => false,
        })
        .cloned()
        .collect()
}

/// 编码一个位置路径
fn encode_dom_path(root_tag: &str, indices: &[usize], attr: Option<&str>) -> String {
    let mut path = String::from(root_tag);
    for index in indices {
        path.push('/');
        path.push_str(&index.to_string());
    }
    if let Some(attr) = attr {
        path.push('#');
        path.push_str(attr);
    }
    path
}

/// 解析一个位置路径
///
/// 返回(根标签, 索引序列, 可选属性名)；不满足文法的输入返回None
pub fn parse_dom_path(path: &str) -> Option<(String, Vec<usize>, Option<String>)> {
    let path_regex = match Regex::new(r"^(head|body)((?:/\d+)+)(?:#([A-Za-z][A-Za-z0-9-]*))?$") {
        Ok(regex) => regex,
        Err(_) => return None,
    };

    let captures = path_regex.captures(path)?;
    let root_tag = captures.get(1)?.as_str().to_string();
    let indices = captures
        .get(2)?
        .as_str()
        .split('/')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .ok()?;
    let attr = captures.get(3).map(|m| m.as_str().to_string());

    Some((root_tag, indices, attr))
}

/// 在直接子节点中查找指定名称的元素
fn find_child_element(node: &Handle, element_name: &str) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|child| match &child.data {
            NodeData::Element { name, .. } => name.local.as_ref() == element_name,
            _ => false,
        })
        .cloned()
}

/// 设置元素属性（已存在则覆盖，不存在则新建）
fn set_node_attr(node: &Handle, attr_name: &str, attr_value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut found_existing_attr = false;

        for attr in attrs_mut.iter_mut() {
            if attr.name.local.as_ref() == attr_name {
                found_existing_attr = true;
                attr.value.clear();
                attr.value.push_slice(attr_value);
            }
        }

        if !found_existing_attr {
            attrs_mut.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                value: format_tendril!("{}", attr_value),
            });
        }
    }
}

/// 设置文本节点内容；目标不是文本节点时返回false
fn set_text_content(node: &Handle, text: &str) -> bool {
    if let NodeData::Text { contents } = &node.data {
        let mut content_ref = contents.borrow_mut();
        content_ref.clear();
        content_ref.push_slice(text);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const SAMPLE: &str = "<!DOCTYPE html><html><head><meta name=\"description\" content=\"Great site\"><title>Hello</title></head><body><p>First</p><img alt=\"Logo\"><p>Second<b>bold</b></p><a title=\"Home\" href=\"/\">Go</a></body></html>";

    fn get(payload: &LocalizablePayload, key: &str) -> String {
        payload
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_else(|| panic!("missing key {}", key))
            .to_string()
    }

    #[test]
    fn test_extract_paths_and_values() {
        let doc = ExtractedDocument::parse(SAMPLE).unwrap();
        let payload = doc.extract();

        // head子树：meta在前，title在后
        assert_eq!(get(&payload, "head/0#content"), "Great site");
        assert_eq!(get(&payload, "head/1/0"), "Hello");

        // body子树
        assert_eq!(get(&payload, "body/0/0"), "First");
        assert_eq!(get(&payload, "body/1#alt"), "Logo");
        assert_eq!(get(&payload, "body/2/0"), "Second");
        assert_eq!(get(&payload, "body/2/1/0"), "bold");
        assert_eq!(get(&payload, "body/3#title"), "Home");
        assert_eq!(get(&payload, "body/3/0"), "Go");

        assert_eq!(payload.len(), 8);
    }

    #[test]
    fn test_script_and_style_content_never_extracted() {
        let html = "<html><head><style>p { color: red }</style></head><body><script>alert(1)</script><p>Visible</p></body></html>";
        let doc = ExtractedDocument::parse(html).unwrap();
        let payload = doc.extract();

        for value in payload.values() {
            let text = value.as_str().unwrap();
            assert!(!text.contains("alert(1)"));
            assert!(!text.contains("color: red"));
        }
        // script占据body索引0，p的路径仍然稳定
        assert_eq!(get(&payload, "body/1/0"), "Visible");
    }

    #[test]
    fn test_identity_roundtrip_preserves_document() {
        // 输入已带lang="es"，恒等回写后应与基线序列化逐字节一致
        let html = "<!DOCTYPE html><html lang=\"es\"><head><title>Hi</title></head><body><p>One</p><p>Two<b>three</b></p></body></html>";

        let baseline = ExtractedDocument::parse(html).unwrap().serialize().unwrap();

        let doc = ExtractedDocument::parse(html).unwrap();
        let payload = doc.extract();
        doc.apply(&payload, "es");
        let roundtripped = doc.serialize().unwrap();

        assert_eq!(baseline, roundtripped);
    }

    #[test]
    fn test_apply_writes_translations_and_lang() {
        let doc = ExtractedDocument::parse(SAMPLE).unwrap();
        let mut translations = LocalizablePayload::new();
        translations.insert("body/0/0".to_string(), Value::String("Primero".to_string()));
        translations.insert("body/1#alt".to_string(), Value::String("Logotipo".to_string()));

        doc.apply(&translations, "es");
        let output = doc.serialize().unwrap();

        assert!(output.contains("Primero"));
        assert!(!output.contains(">First<"));
        assert!(output.contains("alt=\"Logotipo\""));
        assert!(output.contains("lang=\"es\""));
    }

    #[test]
    fn test_unresolvable_path_is_silently_skipped() {
        let doc = ExtractedDocument::parse(SAMPLE).unwrap();
        let baseline = {
            let fresh = ExtractedDocument::parse(SAMPLE).unwrap();
            fresh.apply(&LocalizablePayload::new(), "es");
            fresh.serialize().unwrap()
        };

        let mut translations = LocalizablePayload::new();
        translations.insert("body/9/9/9".to_string(), Value::String("ghost".to_string()));
        translations.insert("not-a-path".to_string(), Value::String("ghost".to_string()));
        translations.insert("body/0".to_string(), Value::String("ghost".to_string()));

        // 不panic，文档除lang外保持不变
        doc.apply(&translations, "es");
        assert_eq!(doc.serialize().unwrap(), baseline);
    }

    #[test]
    fn test_empty_attribute_not_extracted() {
        // 空值属性不产生条目，但仍占据过滤后子节点索引
        let html = "<html><head></head><body><img alt=\"\"><img alt=\"Logo\"></body></html>";
        let doc = ExtractedDocument::parse(html).unwrap();
        let payload = doc.extract();

        assert!(payload.get("body/0#alt").is_none());
        assert_eq!(get(&payload, "body/1#alt"), "Logo");
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn test_empty_document_accepted() {
        let doc = ExtractedDocument::parse("").unwrap();
        assert!(doc.extract().is_empty());
    }

    #[test]
    fn test_parse_dom_path_grammar() {
        assert_eq!(
            parse_dom_path("body/0/2#alt"),
            Some(("body".to_string(), vec![0, 2], Some("alt".to_string())))
        );
        assert_eq!(
            parse_dom_path("head/10"),
            Some(("head".to_string(), vec![10], None))
        );

        // 文法要求至少一个索引，根标签限定head/body
        assert_eq!(parse_dom_path("body"), None);
        assert_eq!(parse_dom_path("div/0"), None);
        assert_eq!(parse_dom_path("body/x"), None);
        assert_eq!(parse_dom_path("body/0#"), None);
    }
}
