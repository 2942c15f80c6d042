use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>AI Legal Team Agents</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 0; color: #1d1d1f; display: flex; min-height: 100vh; }
    aside { width: 300px; padding: 1.5rem; background: #f4f5f7; border-right: 1px solid #ddd; }
    main { flex: 1; padding: 1.5rem 2rem; }
    h1 { margin-top: 0; }
    label { display: block; margin-top: 0.75rem; font-weight: 600; }
    input, select, textarea { width: 100%; padding: 0.5rem; box-sizing: border-box; }
    button { margin-top: 1rem; padding: 0.6rem 1rem; }
    .msg { padding: 0.5rem 0.75rem; border-radius: 6px; margin: 0.4rem 0; }
    .success { background: #e6f4ea; } .info { background: #e8f0fe; }
    .warning { background: #fef7e0; } .error { background: #fce8e6; }
    .tabs button { margin-right: 0.25rem; }
    .tabs button.active { font-weight: 700; }
    pre { background: #f6f8fa; padding: 1rem; white-space: pre-wrap; }
    #customQueryBox { display: none; }
  </style>
</head>
<body>
  <aside>
    <h2>API Configuration</h2>
    <label for="apiKey">OpenAI API Key</label>
    <input id="apiKey" type="password" />
    <button id="saveKeyBtn">Save key</button>

    <h2>Document Upload</h2>
    <label for="chunkSize">Chunk Size</label>
    <input id="chunkSize" type="number" min="1" max="5000" value="1000" />
    <label for="overlap">Overlap</label>
    <input id="overlap" type="number" min="1" max="1000" value="200" />
    <label for="fileInput">Upload Legal Document</label>
    <input id="fileInput" type="file" accept="application/pdf,.pdf" />
    <button id="uploadBtn">Process document</button>
    <div id="sidebarMessages"></div>
  </aside>

  <main>
    <h1>AI Legal Team Agents</h1>
    <div id="messages"></div>

    <label for="analysisType">Select Analysis Type</label>
    <select id="analysisType"></select>
    <div id="customQueryBox">
      <label for="customQuery">Enter your specific query:</label>
      <textarea id="customQuery" rows="3"></textarea>
    </div>
    <button id="analyzeBtn">Analyze</button>

    <div class="tabs">
      <button data-tab="analysis" class="active">Analysis</button>
      <button data-tab="key_points">Key Points</button>
      <button data-tab="recommendations">Recommendations</button>
    </div>
    <pre id="tabContent"></pre>

    <h3>Document Details</h3>
    <pre id="details"></pre>
  </main>

  <script>
    let sessionId = null;
    let report = null;
    let activeTab = 'analysis';

    const $ = (id) => document.getElementById(id);

    function render(target, messages) {
      $(target).innerHTML = '';
      for (const m of messages || []) {
        const div = document.createElement('div');
        div.className = 'msg ' + m.level;
        div.textContent = m.text;
        $(target).appendChild(div);
      }
    }

    async function call(url, options) {
      const res = await fetch(url, options);
      const type = res.headers.get('content-type') || '';
      const body = type.includes('application/json') ? await res.json() : { error: await res.text() };
      if (!res.ok) throw new Error(body.error || res.status + ' ' + res.statusText);
      return body;
    }

    async function refresh() {
      const s = await call('/api/sessions/' + sessionId);
      render('messages', s.messages);
      $('details').textContent = s.documents.map(d =>
        d.filename + ' (' + d.size_bytes + ' bytes, ' + (d.page_count ?? '?') + ' pages, ' +
        d.chunk_count + ' chunks)\n' + (d.preview || '')).join('\n\n');
    }

    function showTab() {
      document.querySelectorAll('.tabs button').forEach(b =>
        b.classList.toggle('active', b.dataset.tab === activeTab));
      $('tabContent').textContent = report ? report[activeTab] : '';
    }

    async function init() {
      // Reuse this tab's session across reloads; the server drops it once idle.
      const saved = sessionStorage.getItem('sessionId');
      if (saved) {
        try {
          const s = await call('/api/sessions/' + saved);
          sessionId = s.session_id;
          render('messages', s.messages);
        } catch (e) {
          sessionStorage.removeItem('sessionId');
        }
      }
      if (!sessionId) {
        const s = await call('/api/sessions', { method: 'POST' });
        sessionId = s.session_id;
        sessionStorage.setItem('sessionId', sessionId);
        render('messages', s.messages);
      }
      const types = await call('/api/analysis-types');
      for (const t of types) {
        const opt = document.createElement('option');
        opt.value = t.id;
        opt.textContent = t.label;
        $('analysisType').appendChild(opt);
      }
    }

    $('analysisType').addEventListener('change', () => {
      $('customQueryBox').style.display = $('analysisType').value === 'custom_query' ? 'block' : 'none';
    });

    $('saveKeyBtn').addEventListener('click', async () => {
      const r = await call('/api/sessions/' + sessionId + '/credentials', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ api_key: $('apiKey').value })
      });
      render('sidebarMessages', r.messages);
    });

    $('uploadBtn').addEventListener('click', async () => {
      const file = $('fileInput').files[0];
      if (!file) return render('sidebarMessages', [{ level: 'warning', text: 'Select a PDF first.' }]);
      const form = new FormData();
      form.append('chunk_size', $('chunkSize').value);
      form.append('overlap', $('overlap').value);
      form.append('file', file);
      render('sidebarMessages', [{ level: 'info', text: 'Processing document...' }]);
      try {
        const r = await call('/api/sessions/' + sessionId + '/documents', { method: 'POST', body: form });
        render('sidebarMessages', r.messages);
        await refresh();
      } catch (e) {
        render('sidebarMessages', [{ level: 'error', text: e.message }]);
      }
    });

    $('analyzeBtn').addEventListener('click', async () => {
      $('tabContent').textContent = 'Analyzing...';
      try {
        report = await call('/api/sessions/' + sessionId + '/analysis', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ analysis_type: $('analysisType').value, query: $('customQuery').value })
        });
        showTab();
      } catch (e) {
        report = null;
        $('tabContent').textContent = e.message;
      }
    });

    document.querySelectorAll('.tabs button').forEach(b => b.addEventListener('click', () => {
      activeTab = b.dataset.tab;
      showTab();
    }));

    init().catch(e => render('messages', [{ level: 'error', text: e.message }]));
  </script>
</body>
</html>"#)
}
